//! Edge list extraction
//!
//! Flattens the graph's adjacency multi-map into a contiguous sequence of
//! `(source, target, weight)` triples once per computation run, so relaxation
//! passes never touch the map again.
//!
//! For the GPU kernel the same edges are regrouped by source into a CSR
//! (as in `GraphBLAST`), keeping edge-list order inside each row:
//!
//! ```text
//! Edges (edge-list order): 0 → 2 (5), 1 → 2 (1), 0 → 1 (2)
//!
//! CSR:
//!   offsets: [0, 2, 3, 3]   // vertex 0: [0..2), vertex 1: [2..3)
//!   targets: [2, 1, 2]      // stable: 0→2 precedes 0→1
//!   weights: [5, 2, 1]
//! ```

use crate::storage::{SparseGraph, VertexId};

/// One flattened edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightedEdge {
    /// Source vertex index
    pub source: u32,
    /// Target vertex index
    pub target: u32,
    /// Non-negative weight
    pub weight: u32,
}

/// Flattened edge snapshot over a fixed vertex range `0..num_vertices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeList {
    edges: Vec<WeightedEdge>,
    num_vertices: usize,
}

impl EdgeList {
    /// Snapshot every edge of `graph`
    ///
    /// `num_vertices` is the graph's vertex bound so indices address
    /// matrix columns directly.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Vertex ids are at most u32
    pub fn from_graph<T: VertexId>(graph: &SparseGraph<T>) -> Self {
        let mut edges = Vec::with_capacity(graph.num_edges());
        for (src, edge) in graph.iter_edges() {
            edges.push(WeightedEdge {
                source: src.index() as u32,
                target: edge.end.index() as u32,
                weight: edge.weight,
            });
        }

        Self {
            edges,
            num_vertices: graph.vertex_bound(),
        }
    }

    /// Build from raw triples
    ///
    /// Triples referencing indices `>= num_vertices` are dropped.
    #[must_use]
    pub fn from_triples(num_vertices: usize, triples: &[(u32, u32, u32)]) -> Self {
        let edges = triples
            .iter()
            .filter(|(s, t, _)| (*s as usize) < num_vertices && (*t as usize) < num_vertices)
            .map(|&(source, target, weight)| WeightedEdge {
                source,
                target,
                weight,
            })
            .collect();

        Self {
            edges,
            num_vertices,
        }
    }

    /// Edges in extraction order
    #[must_use]
    pub fn as_slice(&self) -> &[WeightedEdge] {
        &self.edges
    }

    /// Iterate edges in extraction order
    pub fn iter(&self) -> std::slice::Iter<'_, WeightedEdge> {
        self.edges.iter()
    }

    /// Number of edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no edges
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Vertex range covered by this snapshot
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Largest edge weight (0 for an empty list)
    #[must_use]
    pub fn max_weight(&self) -> u32 {
        self.edges.iter().map(|e| e.weight).max().unwrap_or(0)
    }

    /// Regroup edges into a forward CSR, preserving edge-list order per source
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Edge counts >4B not supported
    pub fn outgoing(&self) -> OutgoingEdges {
        let n = self.num_vertices;

        let mut offsets = vec![0_u32; n + 1];
        for edge in &self.edges {
            offsets[edge.source as usize + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }

        // Counting sort: the cursor walks edges in order, so ties stay stable
        let mut cursor: Vec<u32> = offsets[..n].to_vec();
        let mut targets = vec![0_u32; self.edges.len()];
        let mut weights = vec![0_u32; self.edges.len()];
        for edge in &self.edges {
            let slot = &mut cursor[edge.source as usize];
            targets[*slot as usize] = edge.target;
            weights[*slot as usize] = edge.weight;
            *slot += 1;
        }

        OutgoingEdges {
            offsets,
            targets,
            weights,
        }
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a WeightedEdge;
    type IntoIter = std::slice::Iter<'a, WeightedEdge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Forward CSR of an edge list (one row per source vertex)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEdges {
    /// Row offsets, length `num_vertices + 1`
    pub offsets: Vec<u32>,
    /// Edge targets grouped by source
    pub targets: Vec<u32>,
    /// Edge weights, parallel to `targets`
    pub weights: Vec<u32>,
}

impl OutgoingEdges {
    /// Outgoing `(target, weight)` pairs of `source`
    pub fn of(&self, source: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let start = self.offsets[source] as usize;
        let end = self.offsets[source + 1] as usize;
        self.targets[start..end]
            .iter()
            .copied()
            .zip(self.weights[start..end].iter().copied())
    }

    /// Number of source rows
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }
}
