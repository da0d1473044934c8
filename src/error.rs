//! Error types for graph construction and distance-matrix computation

use std::ops::Range;
use thiserror::Error;

#[cfg(feature = "gpu")]
use crate::gpu::GpuDeviceError;

/// Graph store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Vertex id is already present in the arena
    #[error("Vertex {0} already exists")]
    DuplicateVertex(usize),

    /// Vertex id does not refer to a live vertex
    #[error("Vertex {0} does not exist")]
    UnknownVertex(usize),

    /// Keyword id is outside `0..keyword_count`
    #[error("Keyword {keyword} out of range (keyword count {keyword_count})")]
    KeywordOutOfRange {
        /// Offending keyword id
        keyword: usize,
        /// Configured keyword count of the graph
        keyword_count: usize,
    },

    /// Vertex id cannot be represented by the graph's identifier width
    #[error("Vertex index {0} does not fit the vertex id type")]
    IdOverflow(usize),
}

/// Distance-matrix computation errors
///
/// Every variant that aborts a computation names the backend (and batch,
/// where applicable) so an operator can retry with the other backend.
#[derive(Debug, Error)]
pub enum KeywordDistanceError {
    /// Graph store rejected an operation
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Computation requested on a graph without edges
    #[error("{backend} backend: graph has no edges")]
    EmptyEdgeList {
        /// Backend that refused the run
        backend: &'static str,
    },

    /// Kernel compilation or pipeline link failed; the matrix was not touched
    #[error("Device program error: {message}")]
    DeviceProgram {
        /// Validation message reported by the driver
        message: String,
    },

    /// Buffer allocation or map failed; remaining batches were skipped
    ///
    /// Rows of batches before `batch` are complete (see
    /// [`ResultMatrix::is_row_complete`](crate::ResultMatrix::is_row_complete)).
    #[error("Device buffer error in batch {batch} (keywords {keywords:?}): {message}")]
    DeviceBuffer {
        /// Zero-based batch index
        batch: usize,
        /// Keyword rows covered by the failed batch
        keywords: Range<usize>,
        /// Underlying failure
        message: String,
    },

    /// GPU adapter/device could not be acquired
    #[cfg(feature = "gpu")]
    #[error(transparent)]
    Device(#[from] GpuDeviceError),

    /// Result matrix dimensions do not match the graph
    #[error("Matrix dimensions {actual:?} do not match graph dimensions {expected:?}")]
    DimensionMismatch {
        /// (keywords, vertices) required by the graph
        expected: (usize, usize),
        /// (keywords, vertices) of the supplied matrix
        actual: (usize, usize),
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl KeywordDistanceError {
    /// Whether this failure is specific to the device and worth retrying on the CPU
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        match self {
            Self::DeviceProgram { .. } | Self::DeviceBuffer { .. } => true,
            #[cfg(feature = "gpu")]
            Self::Device(_) => true,
            // CPU tolerates edgeless graphs, so this one is recoverable too
            Self::EmptyEdgeList { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_display() {
        assert_eq!(
            GraphError::DuplicateVertex(3).to_string(),
            "Vertex 3 already exists"
        );
        assert_eq!(
            GraphError::KeywordOutOfRange {
                keyword: 12,
                keyword_count: 10
            }
            .to_string(),
            "Keyword 12 out of range (keyword count 10)"
        );
    }

    #[test]
    fn test_device_buffer_error_carries_context() {
        let err = KeywordDistanceError::DeviceBuffer {
            batch: 2,
            keywords: 8..12,
            message: "map failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Device buffer error in batch 2 (keywords 8..12): map failed"
        );
        assert!(err.is_device_error());
    }

    #[test]
    fn test_graph_errors_are_not_device_errors() {
        let err: KeywordDistanceError = GraphError::UnknownVertex(1).into();
        assert!(!err.is_device_error());
        assert!(!KeywordDistanceError::InvalidConfig("x".into()).is_device_error());
    }
}
