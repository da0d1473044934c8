//! Keyword distance matrix (W × V grid of atomic cells)
//!
//! Each cell packs `(predecessor, distance)` into one `AtomicU64`, so a
//! reader sampling a cell while a backend is still writing its row sees
//! either the old pair or the new pair, never a mix. Every cell has exactly
//! one writer per run, so stores are plain release stores (no CAS).
//!
//! ```text
//! bit 63 ........ 32 31 ......... 0
//!     predecessor     distance
//! ```

use crate::algorithms::{fits_sentinel, KeywordRow, NO_PREDECESSOR, UNREACHABLE};
use crate::error::KeywordDistanceError;
use crate::storage::{SparseGraph, VertexId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One `(keyword, vertex)` result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    /// Next vertex toward the nearest keyword holder (itself for holders)
    pub pred: Option<u32>,
    /// Distance to the nearest keyword holder ([`UNREACHABLE`] if none)
    pub dist: u32,
}

impl Pair {
    /// Cell with no path
    pub const UNREACHABLE: Self = Self {
        pred: None,
        dist: UNREACHABLE,
    };

    /// Cell of a vertex that holds the keyword itself
    #[must_use]
    pub const fn source(vertex: u32) -> Self {
        Self {
            pred: Some(vertex),
            dist: 0,
        }
    }

    /// Distance if reachable
    #[must_use]
    pub const fn distance(&self) -> Option<u32> {
        if self.dist < UNREACHABLE {
            Some(self.dist)
        } else {
            None
        }
    }

    /// Whether some keyword holder is reachable
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.distance().is_some()
    }

    const fn pack(self) -> u64 {
        let pred = match self.pred {
            Some(p) => p,
            None => NO_PREDECESSOR,
        };
        ((pred as u64) << 32) | self.dist as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn unpack(bits: u64) -> Self {
        let pred = (bits >> 32) as u32;
        Self {
            pred: if pred == NO_PREDECESSOR {
                None
            } else {
                Some(pred)
            },
            dist: bits as u32,
        }
    }
}

impl Default for Pair {
    fn default() -> Self {
        Self::UNREACHABLE
    }
}

/// Atomically readable/writable [`Pair`]
#[derive(Debug)]
pub struct AtomicPair(AtomicU64);

impl AtomicPair {
    /// Create cell holding `pair`
    #[must_use]
    pub const fn new(pair: Pair) -> Self {
        Self(AtomicU64::new(pair.pack()))
    }

    /// Read the most recently stored pair
    #[must_use]
    pub fn load(&self) -> Pair {
        Pair::unpack(self.0.load(Ordering::Acquire))
    }

    /// Publish a new pair
    pub fn store(&self, pair: Pair) {
        self.0.store(pair.pack(), Ordering::Release);
    }
}

impl Default for AtomicPair {
    fn default() -> Self {
        Self::new(Pair::UNREACHABLE)
    }
}

/// W × V result matrix shared between a backend and readers
///
/// # Example
///
/// ```
/// use keyword_distance::{Pair, ResultMatrix};
///
/// let matrix = ResultMatrix::new(2, 3);
/// assert_eq!(matrix.dimensions(), (2, 3));
/// assert_eq!(matrix.read(1, 2), Pair::UNREACHABLE);
///
/// matrix.write(1, 2, Pair::source(2));
/// assert_eq!(matrix.read(1, 2).distance(), Some(0));
/// ```
#[derive(Debug)]
pub struct ResultMatrix {
    keywords: usize,
    vertices: usize,
    cells: Box<[AtomicPair]>,
    completed: Box<[AtomicBool]>,
}

impl ResultMatrix {
    /// Allocate a `keywords × vertices` matrix of unreachable cells
    #[must_use]
    pub fn new(keywords: usize, vertices: usize) -> Self {
        let cells = (0..keywords * vertices)
            .map(|_| AtomicPair::default())
            .collect();
        let completed = (0..keywords).map(|_| AtomicBool::new(false)).collect();

        Self {
            keywords,
            vertices,
            cells,
            completed,
        }
    }

    /// Allocate after checking that `max_edge_weight` leaves sentinel headroom
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a path over `vertices` vertices could reach
    /// the unreachable sentinel
    pub fn with_max_edge_weight(
        keywords: usize,
        vertices: usize,
        max_edge_weight: u32,
    ) -> Result<Self, KeywordDistanceError> {
        if !fits_sentinel(max_edge_weight, vertices) {
            return Err(KeywordDistanceError::InvalidConfig(format!(
                "max edge weight {max_edge_weight} over {vertices} vertices exceeds the unreachable sentinel"
            )));
        }
        Ok(Self::new(keywords, vertices))
    }

    /// Allocate a matrix sized for `graph` (keyword count × vertex bound)
    #[must_use]
    pub fn for_graph<T: VertexId>(graph: &SparseGraph<T>) -> Self {
        Self::new(graph.keyword_count(), graph.vertex_bound())
    }

    /// `(W, V)`
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.keywords, self.vertices)
    }

    /// Read cell `(keyword, vertex)`
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the matrix
    #[must_use]
    pub fn read(&self, keyword: usize, vertex: usize) -> Pair {
        self.cell(keyword, vertex).load()
    }

    /// Read cell `(keyword, vertex)` if in bounds
    #[must_use]
    pub fn get(&self, keyword: usize, vertex: usize) -> Option<Pair> {
        (keyword < self.keywords && vertex < self.vertices)
            .then(|| self.cells[keyword * self.vertices + vertex].load())
    }

    /// Overwrite cell `(keyword, vertex)`
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the matrix
    pub fn write(&self, keyword: usize, vertex: usize, pair: Pair) {
        self.cell(keyword, vertex).store(pair);
    }

    /// Publish a relaxed row cell by cell, then flag it complete
    ///
    /// # Panics
    ///
    /// Panics if the keyword is outside the matrix or the row length differs
    pub fn write_row(&self, keyword: usize, row: &KeywordRow) {
        assert_eq!(row.len(), self.vertices, "row length must equal vertex count");

        let cells = &self.cells[keyword * self.vertices..(keyword + 1) * self.vertices];
        for (cell, (&dist, &pred)) in cells.iter().zip(row.dist.iter().zip(&row.pred)) {
            cell.store(Pair::unpack((u64::from(pred) << 32) | u64::from(dist)));
        }
        self.completed[keyword].store(true, Ordering::Release);
    }

    /// Snapshot of one keyword row
    #[must_use]
    pub fn row(&self, keyword: usize) -> Vec<Pair> {
        (0..self.vertices).map(|v| self.read(keyword, v)).collect()
    }

    /// Iterate row snapshots in keyword order (export order)
    pub fn rows(&self) -> impl Iterator<Item = Vec<Pair>> + '_ {
        (0..self.keywords).map(|w| self.row(w))
    }

    /// Whether a backend has published the full row for `keyword`
    #[must_use]
    pub fn is_row_complete(&self, keyword: usize) -> bool {
        self.completed
            .get(keyword)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Number of completed rows
    #[must_use]
    pub fn completed_rows(&self) -> usize {
        self.completed
            .iter()
            .filter(|flag| flag.load(Ordering::Acquire))
            .count()
    }

    /// Check that the matrix is sized for `graph`
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `(W, V)` differs from the graph's
    pub fn check_graph<T: VertexId>(
        &self,
        graph: &SparseGraph<T>,
    ) -> Result<(), KeywordDistanceError> {
        let expected = (graph.keyword_count(), graph.vertex_bound());
        if self.dimensions() == expected {
            Ok(())
        } else {
            Err(KeywordDistanceError::DimensionMismatch {
                expected,
                actual: self.dimensions(),
            })
        }
    }

    fn cell(&self, keyword: usize, vertex: usize) -> &AtomicPair {
        assert!(
            keyword < self.keywords && vertex < self.vertices,
            "cell ({keyword}, {vertex}) outside {}x{} matrix",
            self.keywords,
            self.vertices
        );
        &self.cells[keyword * self.vertices + vertex]
    }
}
