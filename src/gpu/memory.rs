//! GPU memory limits and batch clamping
//!
//! Each batch binds `batch × V` distance and predecessor buffers, so the
//! device's storage binding limit caps how many keywords fit in one batch.

use super::GpuDevice;
use std::mem::size_of;

/// Buffer limits relevant to batch sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMemoryLimits {
    /// Largest buffer the device will allocate (bytes)
    pub max_buffer_size: u64,

    /// Largest range bindable as a storage buffer (bytes)
    pub max_storage_binding: u64,
}

impl GpuMemoryLimits {
    /// Read limits from an initialized device
    #[must_use]
    pub fn detect(device: &GpuDevice) -> Self {
        let limits = device.limits();
        Self {
            max_buffer_size: limits.max_buffer_size,
            max_storage_binding: u64::from(limits.max_storage_buffer_binding_size),
        }
    }

    /// Maximum keyword rows whose `u32` cells fit one storage binding
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_batch_rows(&self, num_vertices: usize) -> usize {
        if num_vertices == 0 {
            return usize::MAX;
        }
        let row_bytes = (num_vertices * size_of::<u32>()) as u64;
        (self.max_storage_binding.min(self.max_buffer_size) / row_bytes) as usize
    }

    /// Clamp a requested batch size to the device (never below one row)
    #[must_use]
    pub fn clamp_batch(&self, requested: usize, num_vertices: usize) -> usize {
        requested.min(self.max_batch_rows(num_vertices)).max(1)
    }

    /// Device bytes held by one batch of `rows` keywords
    ///
    /// Bitmap, two ping-pong distance/predecessor pairs and two staging buffers.
    #[must_use]
    pub fn batch_bytes(rows: usize, num_vertices: usize) -> usize {
        let cells = rows * num_vertices * size_of::<u32>();
        let bitmap = rows * num_vertices.div_ceil(32) * size_of::<u32>();
        bitmap + 6 * cells
    }
}
