//! Static GPU buffers for the forward CSR of an edge list
//!
//! Uploaded once per computation and shared by every keyword batch.

use super::{GpuDevice, GpuDeviceError};
use crate::algorithms::OutgoingEdges;

/// GPU buffers for the forward CSR (`offsets`, `targets`, `weights`)
#[derive(Debug)]
pub struct GpuEdgeBuffers {
    num_vertices: usize,
    num_edges: usize,

    /// Row offsets (size: `num_vertices` + 1)
    pub offsets: wgpu::Buffer,

    /// Edge targets grouped by source (size: `num_edges`)
    pub targets: wgpu::Buffer,

    /// Edge weights parallel to `targets` (size: `num_edges`)
    pub weights: wgpu::Buffer,
}

impl GpuEdgeBuffers {
    /// Upload a forward CSR to the GPU
    ///
    /// # Errors
    ///
    /// Returns error if a buffer allocation is rejected
    pub async fn from_outgoing(
        device: &GpuDevice,
        outgoing: &OutgoingEdges,
    ) -> Result<Self, GpuDeviceError> {
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;

        let offsets = device
            .create_buffer_init("CSR offsets", bytemuck::cast_slice(&outgoing.offsets), usage)
            .await?;
        let targets = device
            .create_buffer_init("CSR targets", bytemuck::cast_slice(&outgoing.targets), usage)
            .await?;
        let weights = device
            .create_buffer_init("CSR weights", bytemuck::cast_slice(&outgoing.weights), usage)
            .await?;

        Ok(Self {
            num_vertices: outgoing.num_vertices(),
            num_edges: outgoing.targets.len(),
            offsets,
            targets,
            weights,
        })
    }

    /// Number of CSR rows
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of edges
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }
}

impl Drop for GpuEdgeBuffers {
    fn drop(&mut self) {
        self.offsets.destroy();
        self.targets.destroy();
        self.weights.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::EdgeList;

    #[tokio::test]
    async fn test_upload_outgoing_to_gpu() {
        if !GpuDevice::is_gpu_available().await {
            eprintln!("⚠️  Skipping test_upload_outgoing_to_gpu: GPU not available");
            return;
        }

        let device = GpuDevice::new().await.unwrap();
        let edges = EdgeList::from_triples(3, &[(0, 1, 2), (1, 2, 3)]);
        let buffers = GpuEdgeBuffers::from_outgoing(&device, &edges.outgoing())
            .await
            .unwrap();

        assert_eq!(buffers.num_vertices(), 3);
        assert_eq!(buffers.num_edges(), 2);
        assert_eq!(buffers.offsets.size(), 16);
    }
}
