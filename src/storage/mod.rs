//! Graph storage layer
//!
//! Provides the sparse keyword graph and (feature `storage`) Parquet persistence.

pub mod graph;
#[cfg(feature = "storage")]
pub mod parquet;

pub use graph::{Edge, SparseGraph, Vertex, VertexId, DEFAULT_KEYWORD_COUNT};
