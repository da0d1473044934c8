//! Engine configuration
//!
//! Sizes the computation (vertex/keyword counts, maximum edge weight for the
//! unreachable sentinel) and tunes the backends (CPU worker count, GPU batch
//! sizing).

use crate::algorithms::fits_sentinel;
use crate::error::KeywordDistanceError;
use crate::storage::{SparseGraph, VertexId};

/// GPU batch sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBatchConfig {
    /// Graphs with more vertices than this use `min_batch_size`
    pub batch_cutoff_vertices: usize,
    /// Keywords per batch for large graphs
    pub min_batch_size: usize,
    /// Keywords per batch otherwise
    pub default_batch_size: usize,
}

impl GpuBatchConfig {
    /// Keywords per dispatch for a graph of `num_vertices` vertices
    ///
    /// Large graphs trade keyword parallelism for per-batch memory.
    #[must_use]
    pub const fn batch_size_for(&self, num_vertices: usize) -> usize {
        if num_vertices > self.batch_cutoff_vertices {
            self.min_batch_size
        } else {
            self.default_batch_size
        }
    }

    /// Validate batch sizes
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a batch size is zero or the minimum exceeds the default
    pub fn validate(&self) -> Result<(), KeywordDistanceError> {
        if self.min_batch_size == 0 || self.default_batch_size == 0 {
            return Err(KeywordDistanceError::InvalidConfig(
                "GPU batch sizes must be non-zero".to_string(),
            ));
        }
        if self.min_batch_size > self.default_batch_size {
            return Err(KeywordDistanceError::InvalidConfig(format!(
                "minimum batch size {} exceeds default batch size {}",
                self.min_batch_size, self.default_batch_size
            )));
        }
        Ok(())
    }
}

impl Default for GpuBatchConfig {
    fn default() -> Self {
        Self {
            batch_cutoff_vertices: 4096,
            min_batch_size: 4,
            default_batch_size: 64,
        }
    }
}

/// Distance-matrix engine configuration
///
/// # Example
///
/// ```
/// use keyword_distance::EngineConfig;
///
/// let config = EngineConfig::new(1_000, 16, 10).with_worker_threads(4);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.gpu.batch_size_for(1_000), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum vertex bound of graphs this engine accepts
    pub vertex_count: usize,
    /// Maximum keyword count of graphs this engine accepts
    pub keyword_count: usize,
    /// Heaviest edge weight; sizes the unreachable sentinel check
    pub max_edge_weight: u32,
    /// CPU worker threads (0 = one per core)
    pub worker_threads: usize,
    /// GPU batch sizing
    pub gpu: GpuBatchConfig,
}

impl EngineConfig {
    /// Create config for the given graph dimensions
    #[must_use]
    pub fn new(vertex_count: usize, keyword_count: usize, max_edge_weight: u32) -> Self {
        Self {
            vertex_count,
            keyword_count,
            max_edge_weight,
            ..Self::default()
        }
    }

    /// Set the CPU worker pool size
    #[must_use]
    pub const fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Set GPU batch sizing
    #[must_use]
    pub const fn with_gpu_batches(mut self, gpu: GpuBatchConfig) -> Self {
        self.gpu = gpu;
        self
    }

    /// Validate sentinel headroom and batch sizing
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violated constraint
    pub fn validate(&self) -> Result<(), KeywordDistanceError> {
        if !fits_sentinel(self.max_edge_weight, self.vertex_count) {
            return Err(KeywordDistanceError::InvalidConfig(format!(
                "max edge weight {} over {} vertices exceeds the unreachable sentinel",
                self.max_edge_weight, self.vertex_count
            )));
        }
        self.gpu.validate()
    }

    /// Check that `graph` fits the configured dimensions
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the graph has more vertices or keywords, or
    /// heavier edges, than configured
    pub fn check_graph<T: VertexId>(&self, graph: &SparseGraph<T>) -> Result<(), KeywordDistanceError> {
        if graph.vertex_bound() > self.vertex_count {
            return Err(KeywordDistanceError::InvalidConfig(format!(
                "graph has vertex bound {} but config allows {}",
                graph.vertex_bound(),
                self.vertex_count
            )));
        }
        if graph.keyword_count() > self.keyword_count {
            return Err(KeywordDistanceError::InvalidConfig(format!(
                "graph has {} keywords but config allows {}",
                graph.keyword_count(),
                self.keyword_count
            )));
        }
        if let Some(heaviest) = graph.iter_edges().map(|(_, e)| e.weight).max() {
            if heaviest > self.max_edge_weight {
                return Err(KeywordDistanceError::InvalidConfig(format!(
                    "edge weight {heaviest} exceeds configured maximum {}",
                    self.max_edge_weight
                )));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vertex_count: 30,
            keyword_count: 10,
            max_edge_weight: 10,
            worker_threads: 0,
            gpu: GpuBatchConfig::default(),
        }
    }
}
