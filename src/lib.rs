//! keyword-distance: keyword distance matrices over weighted graphs
//!
//! # Overview
//!
//! For every (keyword, vertex) pair the engine computes the shortest
//! distance from the vertex to the nearest holder of the keyword, plus the
//! next hop on that path. Rows are relaxed with a multi-source Bellman-Ford
//! recurrence, either on a CPU thread pool (one task per keyword) or in
//! keyword batches on the GPU (feature `gpu`). Both backends produce the
//! same matrix, so a GPU failure can be retried on the CPU.
//!
//! # Quick Start
//!
//! ```
//! use keyword_distance::{compute_matrix, CpuBackend, Pair, ProgressTracker, SparseGraph};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 0 → 1 → 2, keyword 0 held by vertex 2
//! let mut graph: SparseGraph<u32> = SparseGraph::with_keyword_count(1);
//! for v in 0..3 {
//!     graph.add_vertex(v)?;
//! }
//! graph.add_edge(0, 1, 2)?;
//! graph.add_edge(1, 2, 3)?;
//! graph.add_keyword(2, 0)?;
//!
//! let backend = CpuBackend::new(2)?;
//! let matrix = compute_matrix(&backend, &graph, &ProgressTracker::silent(0)).await?;
//!
//! assert_eq!(matrix.read(0, 0), Pair { pred: Some(1), dist: 5 });
//! assert_eq!(matrix.read(0, 2), Pair::source(2));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Storage**: adjacency multi-map with a bidirectional keyword index,
//!   Parquet-backed persistence (feature `storage`)
//! - **Algorithms**: edge-list snapshot, keyword bitmap, synchronous relaxation
//! - **Backends**: rayon worker pool, batched wgpu compute (feature `gpu`)
//! - **Results**: lock-free matrix of packed `(pred, dist)` cells

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod backend;
pub mod config;
pub mod error;
pub mod matrix;
pub mod progress;
pub mod storage;

#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export core types
pub use algorithms::{GraphSnapshot, NO_PREDECESSOR, UNREACHABLE};
pub use backend::{compute_matrix, compute_with_fallback, CpuBackend, DistanceMatrixBackend};
pub use config::{EngineConfig, GpuBatchConfig};
pub use error::{GraphError, KeywordDistanceError};
pub use matrix::{AtomicPair, Pair, ResultMatrix};
pub use progress::{ProgressTracker, ProgressUpdate};
pub use storage::{SparseGraph, VertexId, DEFAULT_KEYWORD_COUNT};

#[cfg(feature = "gpu")]
pub use gpu::{GpuBackend, GpuDevice, GpuDeviceError, GpuEdgeBuffers, GpuMemoryLimits};

// Error type for storage I/O
pub use anyhow::{Error, Result};
