//! Multi-source keyword relaxation (Bellman-Ford style)
//!
//! For one keyword, every vertex holding it is a source at distance 0; the
//! result row gives each vertex's distance to its nearest source, following
//! edge direction, and the predecessor: the next vertex on that path (the
//! vertex itself for sources).
//!
//! ```text
//! 0 --2--> 1 --3--> 2 [keyword]
//!
//! dist: [5, 3, 0]
//! pred: [1, 2, 2]
//! ```
//!
//! Passes are synchronous: pass `p` reads the arrays produced by pass `p-1`
//! and writes a fresh copy. Edge `a → b` relaxes `a` from `b`. Edges are
//! applied in edge-list order with a strict `<`, so a vertex keeps the first
//! successor that reached its final distance. The GPU kernel evaluates the
//! same recurrence (one work item per vertex scanning its CSR row in
//! edge-list order), which is why both backends agree cell for cell.
//!
//! Exactly `V` passes are run.

use super::{EdgeList, KeywordBitmap};

/// Distance of an unreachable cell
///
/// The top two bits are reserved so `UNREACHABLE + max_weight` cannot wrap.
pub const UNREACHABLE: u32 = u32::MAX >> 2;

/// Predecessor encoding for "none" in raw rows and GPU buffers
pub const NO_PREDECESSOR: u32 = u32::MAX;

/// Whether every path length over `num_vertices` vertices stays below
/// [`UNREACHABLE`] with edges no heavier than `max_weight`
#[must_use]
pub fn fits_sentinel(max_weight: u32, num_vertices: usize) -> bool {
    (u64::from(max_weight)).saturating_mul(num_vertices as u64) < u64::from(UNREACHABLE)
}

/// Relaxed distances and predecessors of one keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRow {
    /// Distance per vertex (`UNREACHABLE` if no source is reachable)
    pub dist: Vec<u32>,
    /// Predecessor per vertex (`NO_PREDECESSOR` if none)
    pub pred: Vec<u32>,
}

impl KeywordRow {
    /// Row with every vertex unreachable
    #[must_use]
    pub fn unreachable(num_vertices: usize) -> Self {
        Self {
            dist: vec![UNREACHABLE; num_vertices],
            pred: vec![NO_PREDECESSOR; num_vertices],
        }
    }

    /// Initial row: sources at distance 0 pointing at themselves
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Vertex ids are at most u32
    pub fn seeded(bitmap: &KeywordBitmap, row: usize) -> Self {
        let mut seeded = Self::unreachable(bitmap.num_vertices());
        for v in bitmap.sources(row) {
            seeded.dist[v] = 0;
            seeded.pred[v] = v as u32;
        }
        seeded
    }

    /// Number of vertices
    #[must_use]
    pub fn len(&self) -> usize {
        self.dist.len()
    }

    /// Whether the row has no vertices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dist.is_empty()
    }

    fn copy_from(&mut self, other: &Self) {
        self.dist.copy_from_slice(&other.dist);
        self.pred.copy_from_slice(&other.pred);
    }
}

/// Apply one synchronous pass: `next = relax(prev)`
///
/// Returns whether any cell improved.
pub fn relax_pass(edges: &EdgeList, prev: &KeywordRow, next: &mut KeywordRow) -> bool {
    next.copy_from(prev);

    let mut changed = false;
    for edge in edges {
        let (a, b) = (edge.source as usize, edge.target as usize);
        let base = prev.dist[b];
        if base >= UNREACHABLE {
            continue;
        }

        let candidate = base.saturating_add(edge.weight);
        if candidate < next.dist[a] {
            next.dist[a] = candidate;
            next.pred[a] = edge.target;
            changed = true;
        }
    }
    changed
}

/// Relax keyword row `row` of `bitmap` over `edges`
///
/// Pure function: all scratch state is private to the call.
///
/// # Example
///
/// ```
/// use keyword_distance::algorithms::{relax_keyword, EdgeList, KeywordBitmap};
///
/// // 0 → 1 (2), 1 → 2 (3); keyword held by vertex 2
/// let edges = EdgeList::from_triples(3, &[(0, 1, 2), (1, 2, 3)]);
/// let mut bitmap = KeywordBitmap::new(0..1, 3);
/// bitmap.insert(0, 2);
///
/// let row = relax_keyword(&edges, &bitmap, 0);
/// assert_eq!(row.dist, vec![5, 3, 0]);
/// assert_eq!(row.pred, vec![1, 2, 2]);
/// ```
#[must_use]
pub fn relax_keyword(edges: &EdgeList, bitmap: &KeywordBitmap, row: usize) -> KeywordRow {
    let num_vertices = edges.num_vertices();
    debug_assert_eq!(num_vertices, bitmap.num_vertices());

    let mut current = KeywordRow::seeded(bitmap, row);
    if edges.is_empty() {
        return current;
    }

    let mut next = current.clone();
    for _ in 0..num_vertices {
        relax_pass(edges, &current, &mut next);
        std::mem::swap(&mut current, &mut next);
    }
    current
}
