//! GPU device initialization and management
//!
//! Handles wgpu device creation, adapter selection, and error scopes around
//! resource creation.

use thiserror::Error;
use wgpu::util::DeviceExt;

/// GPU device errors
#[derive(Debug, Error)]
pub enum GpuDeviceError {
    /// No compatible GPU adapter found
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device
    #[error("Failed to request GPU device: {0}")]
    DeviceRequest(String),

    /// Object creation raised a validation error
    #[error("{label}: validation failed: {message}")]
    Validation {
        /// Label of the object being created
        label: String,
        /// Driver message
        message: String,
    },

    /// Allocation raised an out-of-memory error
    #[error("{label}: out of device memory")]
    OutOfMemory {
        /// Label of the buffer being allocated
        label: String,
    },
}

/// GPU device wrapper for distance-matrix kernels
///
/// # Example
///
/// ```ignore
/// # use keyword_distance::gpu::GpuDevice;
/// let device = GpuDevice::new().await?;
/// println!("{}", device.info().name);
/// ```
#[derive(Debug)]
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
}

impl GpuDevice {
    /// Check if GPU is available without keeping a device
    ///
    /// This is useful for tests to skip gracefully when GPU is not available.
    pub async fn is_gpu_available() -> bool {
        Self::new().await.is_ok()
    }

    /// Initialize GPU device with default settings
    ///
    /// # Errors
    ///
    /// Returns `GpuDeviceError` if no adapter is found or the device request fails
    pub async fn new() -> Result<Self, GpuDeviceError> {
        Self::new_with_backend(wgpu::Backends::all()).await
    }

    /// Initialize GPU device with specific backend
    ///
    /// # Errors
    ///
    /// Returns `GpuDeviceError` if device initialization fails
    pub async fn new_with_backend(backends: wgpu::Backends) -> Result<Self, GpuDeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuDeviceError::NoAdapter)?;

        // Default limits allow 8 storage buffers per stage, which the relaxation kernel uses
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("keyword-distance GPU device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| GpuDeviceError::DeviceRequest(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter,
        })
    }

    /// Get adapter info (GPU name, backend, etc.)
    #[must_use]
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Limits the device was created with
    #[must_use]
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Run `create` inside a validation error scope
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the driver rejected anything created by `create`
    pub async fn validated<R>(
        &self,
        label: &str,
        create: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, GpuDeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let created = create(&self.device);
        match self.device.pop_error_scope().await {
            None => Ok(created),
            Some(err) => Err(GpuDeviceError::Validation {
                label: label.to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// Run `allocate` inside out-of-memory and validation error scopes
    ///
    /// Oversized buffers surface as validation errors, exhausted memory as
    /// `OutOfMemory`.
    ///
    /// # Errors
    ///
    /// Returns the first error the driver reported for the allocation
    pub async fn allocated<R>(
        &self,
        label: &str,
        allocate: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, GpuDeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let result = self.validated(label, allocate).await;
        let oom = self.device.pop_error_scope().await;

        match (result, oom) {
            (Err(err), _) => Err(err),
            (Ok(_), Some(_)) => Err(GpuDeviceError::OutOfMemory {
                label: label.to_string(),
            }),
            (Ok(created), None) => Ok(created),
        }
    }

    /// Create GPU buffer with initial data
    ///
    /// # Errors
    ///
    /// Returns error if the allocation is rejected
    pub async fn create_buffer_init(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, GpuDeviceError> {
        self.allocated(label, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        })
        .await
    }

    /// Create empty GPU buffer
    ///
    /// # Errors
    ///
    /// Returns error if the allocation is rejected
    pub async fn create_buffer(
        &self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, GpuDeviceError> {
        self.allocated(label, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        })
        .await
    }

    /// Get device reference
    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get queue reference
    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
