//! Distance-matrix backends
//!
//! A backend fills a [`ResultMatrix`] from a [`GraphSnapshot`]. Both
//! implementations evaluate the same relaxation recurrence
//! ([`relax_keyword`](crate::algorithms::relax_keyword)), so they are
//! interchangeable: a GPU failure can be retried on the CPU with
//! [`compute_with_fallback`].

mod cpu;

pub use cpu::CpuBackend;

use crate::algorithms::{fits_sentinel, GraphSnapshot};
use crate::error::KeywordDistanceError;
use crate::matrix::ResultMatrix;
use crate::progress::ProgressTracker;
use crate::storage::{SparseGraph, VertexId};
use async_trait::async_trait;
use tracing::{info, warn};

/// Capability to compute a keyword distance matrix
#[async_trait]
pub trait DistanceMatrixBackend: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;

    /// Fill every row of `matrix` for `snapshot`
    ///
    /// Calls `progress.begin` with the backend's unit count, then
    /// `progress.increment` once per finished unit.
    ///
    /// # Errors
    ///
    /// Returns a distinguishable [`KeywordDistanceError`]; rows published
    /// before a failure are flagged complete in the matrix
    async fn compute(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
    ) -> Result<(), KeywordDistanceError>;
}

/// Validate that `matrix` and the snapshot's weights fit together
///
/// # Errors
///
/// Returns `DimensionMismatch` or `InvalidConfig` (sentinel headroom)
pub fn check_run(
    snapshot: &GraphSnapshot,
    matrix: &ResultMatrix,
) -> Result<(), KeywordDistanceError> {
    if matrix.dimensions() != snapshot.dimensions() {
        return Err(KeywordDistanceError::DimensionMismatch {
            expected: snapshot.dimensions(),
            actual: matrix.dimensions(),
        });
    }

    let max_weight = snapshot.edges().max_weight();
    if !fits_sentinel(max_weight, snapshot.num_vertices()) {
        return Err(KeywordDistanceError::InvalidConfig(format!(
            "max edge weight {max_weight} over {} vertices exceeds the unreachable sentinel",
            snapshot.num_vertices()
        )));
    }
    Ok(())
}

/// Snapshot `graph`, allocate a matrix for it and run `backend`
///
/// # Errors
///
/// Propagates the backend's error
pub async fn compute_matrix<T: VertexId>(
    backend: &dyn DistanceMatrixBackend,
    graph: &SparseGraph<T>,
    progress: &ProgressTracker,
) -> Result<ResultMatrix, KeywordDistanceError> {
    let snapshot = GraphSnapshot::from_graph(graph);
    let matrix = ResultMatrix::for_graph(graph);

    info!(
        backend = backend.name(),
        keywords = snapshot.keyword_count(),
        vertices = snapshot.num_vertices(),
        edges = snapshot.edges().len(),
        "computing keyword distance matrix"
    );
    backend.compute(&snapshot, &matrix, progress).await?;

    Ok(matrix)
}

/// Run `primary`; on a device failure rerun on `fallback` into a fresh matrix
///
/// The retry resumes `progress`, so its percentage never drops below what
/// the primary already reported.
///
/// # Errors
///
/// Returns the primary's error if it is not device-specific, otherwise the
/// fallback's error
pub async fn compute_with_fallback<T: VertexId>(
    primary: &dyn DistanceMatrixBackend,
    fallback: &dyn DistanceMatrixBackend,
    graph: &SparseGraph<T>,
    progress: &ProgressTracker,
) -> Result<ResultMatrix, KeywordDistanceError> {
    match compute_matrix(primary, graph, progress).await {
        Err(err) if err.is_device_error() => {
            warn!(
                failed = primary.name(),
                retry = fallback.name(),
                error = %err,
                "backend failed, retrying"
            );
            progress.resume();
            compute_matrix(fallback, graph, progress).await
        }
        result => result,
    }
}
