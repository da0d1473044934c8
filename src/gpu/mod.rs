//! GPU backend for the keyword distance matrix
//!
//! # Architecture
//!
//! - `device`: GPU device initialization and error scopes
//! - `buffer`: static forward-CSR buffers shared by all batches
//! - `memory`: device limits and batch clamping
//! - `keyword_distance`: batched seed/relax kernels (`shaders/keyword_distance.wgsl`)
//!
//! # Feature Flag
//!
//! This module is only available with the `gpu` feature flag:
//! ```bash
//! cargo build --features gpu
//! ```

mod buffer;
mod device;
mod keyword_distance;
mod memory;

pub use buffer::GpuEdgeBuffers;
pub use device::{GpuDevice, GpuDeviceError};
pub use keyword_distance::GpuBackend;
pub use memory::GpuMemoryLimits;
