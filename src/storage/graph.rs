//! Sparse keyword graph (adjacency multi-map + bidirectional keyword index)
//!
//! # Layout
//!
//! ```text
//! Graph: 0 → 1 (w=2), 1 → 2 (w=3); keyword 0 on vertex 2
//!
//! vertices:      [Some(0), Some(1), Some(2)]   // dense arena, index == id
//! adjacency:     {0: [(1, 2)], 1: [(2, 3)]}     // source-keyed multi-map
//! keyword_index: {2: {0}}                       // vertex  → keywords
//! reverse_index: {0: {2}}                       // keyword → vertices
//! ```
//!
//! The graph is built once and then borrowed immutably by a distance-matrix
//! computation; every mutating method takes `&mut self`.

use crate::algorithms::EdgeList;
use crate::error::GraphError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;

/// Keyword count used by [`SparseGraph::new`]
pub const DEFAULT_KEYWORD_COUNT: usize = 10;

/// Unsigned identifier type for vertices and keywords
///
/// The identifier width bounds the arena size, so small graphs can use
/// `u8` or `u16` ids.
pub trait VertexId:
    Copy + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Dense arena index of this id
    fn index(self) -> usize;

    /// Id for a dense index, if the width can represent it
    fn from_index(index: usize) -> Option<Self>;
}

macro_rules! impl_vertex_id {
    ($($ty:ty),*) => {
        $(
            impl VertexId for $ty {
                #[inline]
                fn index(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_index(index: usize) -> Option<Self> {
                    <$ty>::try_from(index).ok()
                }
            }
        )*
    };
}

impl_vertex_id!(u8, u16, u32);

/// Vertex (identity only; keywords live in the graph's indexes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex<T> {
    /// Vertex identifier
    pub id: T,
}

/// Outgoing edge, owned by its source's adjacency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge<T> {
    /// Destination vertex
    pub end: T,
    /// Non-negative edge weight
    pub weight: u32,
}

/// Adjacency-list graph annotated with keyword membership
///
/// # Example
///
/// ```
/// use keyword_distance::SparseGraph;
///
/// let mut graph: SparseGraph<u32> = SparseGraph::with_keyword_count(2);
/// for v in 0..3 {
///     graph.add_vertex(v).unwrap();
/// }
/// graph.add_edge(0, 1, 2).unwrap();
/// graph.add_keyword(2, 0).unwrap();
///
/// assert!(graph.keyword_is_in(0, 2));
/// assert_eq!(graph.vertices_with_keyword(0), vec![2]);
/// ```
#[derive(Debug, Clone)]
pub struct SparseGraph<T: VertexId = u32> {
    /// Dense vertex arena (`None` marks a removed or never-added id)
    vertices: Vec<Option<Vertex<T>>>,

    /// Number of live vertices
    num_vertices: usize,

    /// Source → outgoing edges (insertion order preserved)
    adjacency: BTreeMap<T, Vec<Edge<T>>>,

    /// Total number of edges across all adjacency entries
    num_edges: usize,

    /// Vertex → keywords
    keyword_index: BTreeMap<T, BTreeSet<T>>,

    /// Keyword → vertices
    reverse_index: BTreeMap<T, BTreeSet<T>>,

    /// Exclusive upper bound on keyword ids
    keyword_count: usize,
}

impl<T: VertexId> SparseGraph<T> {
    /// Create empty graph with [`DEFAULT_KEYWORD_COUNT`] keywords
    #[must_use]
    pub fn new() -> Self {
        Self::with_keyword_count(DEFAULT_KEYWORD_COUNT)
    }

    /// Create empty graph whose keyword ids are bounded by `keyword_count`
    #[must_use]
    pub fn with_keyword_count(keyword_count: usize) -> Self {
        Self {
            vertices: Vec::new(),
            num_vertices: 0,
            adjacency: BTreeMap::new(),
            num_edges: 0,
            keyword_index: BTreeMap::new(),
            reverse_index: BTreeMap::new(),
            keyword_count,
        }
    }

    /// Add vertex with the given id
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateVertex` if the id is already present
    pub fn add_vertex(&mut self, id: T) -> Result<(), GraphError> {
        let idx = id.index();
        if self.vertex_exists(id) {
            return Err(GraphError::DuplicateVertex(idx));
        }

        if idx >= self.vertices.len() {
            self.vertices.resize(idx + 1, None);
        }
        self.vertices[idx] = Some(Vertex { id });
        self.num_vertices += 1;

        Ok(())
    }

    /// Append edge `src → dst`
    ///
    /// Multi-edges and self-loops are kept as separate entries.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownVertex` if either endpoint does not exist
    pub fn add_edge(&mut self, src: T, dst: T, weight: u32) -> Result<(), GraphError> {
        self.require_vertex(src)?;
        self.require_vertex(dst)?;

        self.adjacency
            .entry(src)
            .or_default()
            .push(Edge { end: dst, weight });
        self.num_edges += 1;

        Ok(())
    }

    /// Attach `keyword` to `vertex`
    ///
    /// Committed immediately to both indexes. Returns `false` if the
    /// membership already existed (no-op).
    ///
    /// # Errors
    ///
    /// Returns error if the vertex does not exist or the keyword is out of range
    pub fn add_keyword(&mut self, vertex: T, keyword: T) -> Result<bool, GraphError> {
        self.require_vertex(vertex)?;
        if keyword.index() >= self.keyword_count {
            return Err(GraphError::KeywordOutOfRange {
                keyword: keyword.index(),
                keyword_count: self.keyword_count,
            });
        }

        let inserted = self
            .keyword_index
            .entry(vertex)
            .or_default()
            .insert(keyword);
        if inserted {
            self.reverse_index.entry(keyword).or_default().insert(vertex);
        }

        Ok(inserted)
    }

    /// Attach several keywords to one vertex
    ///
    /// Returns how many memberships were new. Validation happens before any
    /// insertion, so a rejected batch leaves the indexes untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the vertex does not exist or any keyword is out of range
    pub fn add_keywords(&mut self, vertex: T, keywords: &[T]) -> Result<usize, GraphError> {
        self.require_vertex(vertex)?;
        if let Some(bad) = keywords.iter().find(|k| k.index() >= self.keyword_count) {
            return Err(GraphError::KeywordOutOfRange {
                keyword: bad.index(),
                keyword_count: self.keyword_count,
            });
        }

        let mut added = 0;
        for &keyword in keywords {
            if self.add_keyword(vertex, keyword)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove vertex together with every edge and membership touching it
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownVertex` if the vertex does not exist
    pub fn remove_vertex(&mut self, id: T) -> Result<(), GraphError> {
        self.require_vertex(id)?;

        self.vertices[id.index()] = None;
        self.num_vertices -= 1;
        while matches!(self.vertices.last(), Some(None)) {
            self.vertices.pop();
        }

        if let Some(outgoing) = self.adjacency.remove(&id) {
            self.num_edges -= outgoing.len();
        }
        let mut removed = 0;
        self.adjacency.retain(|_, edges| {
            let before = edges.len();
            edges.retain(|e| e.end != id);
            removed += before - edges.len();
            !edges.is_empty()
        });
        self.num_edges -= removed;

        if let Some(keywords) = self.keyword_index.remove(&id) {
            for keyword in keywords {
                if let Some(holders) = self.reverse_index.get_mut(&keyword) {
                    holders.remove(&id);
                    if holders.is_empty() {
                        self.reverse_index.remove(&keyword);
                    }
                }
            }
        }

        Ok(())
    }

    /// Remove every edge `start → end`; returns how many were removed
    pub fn remove_edge(&mut self, start: T, end: T) -> usize {
        let Some(edges) = self.adjacency.get_mut(&start) else {
            return 0;
        };

        let before = edges.len();
        edges.retain(|e| e.end != end);
        let removed = before - edges.len();
        if edges.is_empty() {
            self.adjacency.remove(&start);
        }
        self.num_edges -= removed;

        removed
    }

    /// Outgoing edges of a vertex (empty for unknown ids)
    #[must_use]
    pub fn adjacent(&self, id: T) -> &[Edge<T>] {
        self.adjacency.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Keywords attached to a vertex, ascending
    #[must_use]
    pub fn keywords_of(&self, id: T) -> Vec<T> {
        self.keyword_index
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Membership test via the keyword's reverse index
    #[must_use]
    pub fn keyword_is_in(&self, keyword: T, vertex: T) -> bool {
        self.reverse_index
            .get(&keyword)
            .is_some_and(|holders| holders.contains(&vertex))
    }

    /// All vertices holding `keyword`, ascending
    #[must_use]
    pub fn vertices_with_keyword(&self, keyword: T) -> Vec<T> {
        self.holders(keyword.index()).collect()
    }

    /// Holders of a keyword given by dense index (used to seed sources)
    pub(crate) fn holders(&self, keyword: usize) -> impl Iterator<Item = T> + '_ {
        T::from_index(keyword)
            .and_then(|k| self.reverse_index.get(&k))
            .into_iter()
            .flat_map(|holders| holders.iter().copied())
    }

    /// Flattened `(source, target, weight)` snapshot of all edges
    ///
    /// Sources ascend; edges of one source keep insertion order.
    #[must_use]
    pub fn edge_list(&self) -> EdgeList {
        EdgeList::from_graph(self)
    }

    /// Iterate `(source, edge)` in edge-list order
    pub fn iter_edges(&self) -> impl Iterator<Item = (T, Edge<T>)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&src, edges)| edges.iter().map(move |&e| (src, e)))
    }

    /// Iterate live vertex ids, ascending
    pub fn iter_vertices(&self) -> impl Iterator<Item = T> + '_ {
        self.vertices.iter().filter_map(|v| v.map(|v| v.id))
    }

    /// Check whether a vertex id is live
    #[must_use]
    pub fn vertex_exists(&self, id: T) -> bool {
        matches!(self.vertices.get(id.index()), Some(Some(_)))
    }

    /// Number of live vertices
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Highest live vertex id + 1 (matrix column count)
    #[must_use]
    pub fn vertex_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Exclusive upper bound on keyword ids (matrix row count)
    #[must_use]
    pub const fn keyword_count(&self) -> usize {
        self.keyword_count
    }

    /// Number of (vertex, keyword) memberships
    #[must_use]
    pub fn num_memberships(&self) -> usize {
        self.keyword_index.values().map(BTreeSet::len).sum()
    }

    fn require_vertex(&self, id: T) -> Result<(), GraphError> {
        if self.vertex_exists(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(id.index()))
        }
    }
}

impl<T: VertexId> Default for SparseGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: VertexId> fmt::Display for SparseGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.iter_vertices() {
            write!(f, "(id: {id}, adj: <")?;
            for edge in self.adjacent(id) {
                write!(f, "({}, {}) ", edge.end, edge.weight)?;
            }
            write!(f, ">, keywords: ")?;
            for keyword in self.keywords_of(id) {
                write!(f, "{keyword} ")?;
            }
            writeln!(f, ");")?;
        }
        Ok(())
    }
}
