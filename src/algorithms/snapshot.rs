//! Per-run graph snapshot handed to backends
//!
//! Captures everything a backend reads during one computation: the
//! flattened edge list and each keyword's source vertices. Taking the
//! snapshot borrows the graph immutably, and backends never see the graph
//! itself, so it cannot change under a running computation.

use super::EdgeList;
use crate::storage::{SparseGraph, VertexId};

/// Immutable input of one distance-matrix computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSnapshot {
    edges: EdgeList,
    sources: Vec<Vec<u32>>,
}

impl GraphSnapshot {
    /// Extract edges and keyword holders from `graph`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Vertex ids are at most u32
    pub fn from_graph<T: VertexId>(graph: &SparseGraph<T>) -> Self {
        let sources = (0..graph.keyword_count())
            .map(|keyword| graph.holders(keyword).map(|v| v.index() as u32).collect())
            .collect();

        Self {
            edges: graph.edge_list(),
            sources,
        }
    }

    /// Build from parts (`sources[k]` lists the holders of keyword `k`)
    ///
    /// Holders outside the edge list's vertex range are dropped.
    #[must_use]
    pub fn from_parts(edges: EdgeList, mut sources: Vec<Vec<u32>>) -> Self {
        let bound = edges.num_vertices();
        for holders in &mut sources {
            holders.retain(|&v| (v as usize) < bound);
        }
        Self { edges, sources }
    }

    /// Flattened edges
    #[must_use]
    pub const fn edges(&self) -> &EdgeList {
        &self.edges
    }

    /// Holders of `keyword` (empty if out of range)
    #[must_use]
    pub fn sources(&self, keyword: usize) -> &[u32] {
        self.sources.get(keyword).map_or(&[], Vec::as_slice)
    }

    /// Matrix rows (W)
    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.sources.len()
    }

    /// Matrix columns (V)
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.edges.num_vertices()
    }

    /// `(W, V)`
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.keyword_count(), self.num_vertices())
    }
}
