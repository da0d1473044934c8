//! GPU keyword distance backend
//!
//! Keywords are processed in batches. Each batch uploads a membership
//! bitmap, seeds a `batch × V` distance/predecessor pair, runs exactly `V`
//! synchronous relaxation passes over ping-pong buffers and copies the final
//! pair back to the host. The forward CSR is uploaded once per run.

use super::{GpuDevice, GpuDeviceError, GpuEdgeBuffers, GpuMemoryLimits};
use crate::algorithms::{GraphSnapshot, KeywordBitmap, KeywordRow, UNREACHABLE};
use crate::backend::{check_run, DistanceMatrixBackend};
use crate::config::{EngineConfig, GpuBatchConfig};
use crate::error::KeywordDistanceError;
use crate::matrix::ResultMatrix;
use crate::progress::ProgressTracker;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::mem::size_of;
use std::ops::{Deref, Range};
use tracing::{debug, info};

const SHADER: &str = include_str!("shaders/keyword_distance.wgsl");
const WORKGROUP_SIZE: u32 = 256;
const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// Per-batch kernel parameters (uniform)
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct RelaxParams {
    num_vertices: u32,
    batch_len: u32,
    words_per_row: u32,
    unreachable: u32,
}

/// Workgroup grid covering `cells` invocations
#[allow(clippy::cast_possible_truncation)] // cells fit one storage binding
fn dispatch_size(cells: usize) -> (u32, u32) {
    let groups = (cells as u32).div_ceil(WORKGROUP_SIZE).max(1);
    let x = groups.min(MAX_WORKGROUPS_PER_DIMENSION);
    (x, groups.div_ceil(x))
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Seed and relax pipelines sharing one bind group layout
struct RelaxPipelines {
    layout: wgpu::BindGroupLayout,
    seed: wgpu::ComputePipeline,
    relax: wgpu::ComputePipeline,
}

impl RelaxPipelines {
    async fn build(device: &GpuDevice) -> Result<Self, GpuDeviceError> {
        device
            .validated("keyword distance pipelines", |device| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Keyword Distance Shader"),
                    source: wgpu::ShaderSource::Wgsl(SHADER.into()),
                });

                let read_only = wgpu::BufferBindingType::Storage { read_only: true };
                let writable = wgpu::BufferBindingType::Storage { read_only: false };
                let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Keyword Distance Bind Group Layout"),
                    entries: &[
                        layout_entry(0, wgpu::BufferBindingType::Uniform),
                        // CSR offsets, targets, weights
                        layout_entry(1, read_only),
                        layout_entry(2, read_only),
                        layout_entry(3, read_only),
                        // membership bitmap
                        layout_entry(4, read_only),
                        // previous pass
                        layout_entry(5, read_only),
                        layout_entry(6, read_only),
                        // next pass
                        layout_entry(7, writable),
                        layout_entry(8, writable),
                    ],
                });

                let pipeline_layout =
                    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("Keyword Distance Pipeline Layout"),
                        bind_group_layouts: &[&layout],
                        push_constant_ranges: &[],
                    });

                let pipeline = |entry_point: &'static str| {
                    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                        label: Some(entry_point),
                        layout: Some(&pipeline_layout),
                        module: &module,
                        entry_point,
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                        cache: None,
                    })
                };
                let seed = pipeline("seed");
                let relax = pipeline("relax");

                Self {
                    layout,
                    seed,
                    relax,
                }
            })
            .await
    }
}

/// Buffer destroyed when dropped, including on early returns
struct ScopedBuffer(wgpu::Buffer);

impl Deref for ScopedBuffer {
    type Target = wgpu::Buffer;

    fn deref(&self) -> &wgpu::Buffer {
        &self.0
    }
}

impl Drop for ScopedBuffer {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// Device memory of one keyword batch
struct BatchBuffers {
    params: ScopedBuffer,
    bitmap: ScopedBuffer,
    dist: [ScopedBuffer; 2],
    pred: [ScopedBuffer; 2],
    staging_dist: ScopedBuffer,
    staging_pred: ScopedBuffer,
}

impl BatchBuffers {
    async fn allocate(
        device: &GpuDevice,
        params: &RelaxParams,
        bitmap: &KeywordBitmap,
        cell_bytes: u64,
    ) -> Result<Self, GpuDeviceError> {
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        let staging = wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST;

        let params = ScopedBuffer(
            device
                .create_buffer_init(
                    "Keyword Distance Params",
                    bytemuck::bytes_of(params),
                    wgpu::BufferUsages::UNIFORM,
                )
                .await?,
        );
        let bitmap = ScopedBuffer(
            device
                .create_buffer_init(
                    "Keyword Bitmap",
                    bytemuck::cast_slice(bitmap.words()),
                    wgpu::BufferUsages::STORAGE,
                )
                .await?,
        );
        let dist = [
            ScopedBuffer(device.create_buffer("Distances A", cell_bytes, storage).await?),
            ScopedBuffer(device.create_buffer("Distances B", cell_bytes, storage).await?),
        ];
        let pred = [
            ScopedBuffer(device.create_buffer("Predecessors A", cell_bytes, storage).await?),
            ScopedBuffer(device.create_buffer("Predecessors B", cell_bytes, storage).await?),
        ];
        let staging_dist =
            ScopedBuffer(device.create_buffer("Distances Staging", cell_bytes, staging).await?);
        let staging_pred =
            ScopedBuffer(device.create_buffer("Predecessors Staging", cell_bytes, staging).await?);

        Ok(Self {
            params,
            bitmap,
            dist,
            pred,
            staging_dist,
            staging_pred,
        })
    }

    /// Bind group reading pair `input` and writing the other pair
    fn bind_group(
        &self,
        device: &wgpu::Device,
        pipelines: &RelaxPipelines,
        edges: &GpuEdgeBuffers,
        input: usize,
    ) -> wgpu::BindGroup {
        let output = 1 - input;
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Keyword Distance Bind Group"),
            layout: &pipelines.layout,
            entries: &[
                (0, &*self.params),
                (1, &edges.offsets),
                (2, &edges.targets),
                (3, &edges.weights),
                (4, &*self.bitmap),
                (5, &*self.dist[input]),
                (6, &*self.pred[input]),
                (7, &*self.dist[output]),
                (8, &*self.pred[output]),
            ]
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding,
                resource: buffer.as_entire_binding(),
            }),
        })
    }
}

/// Map a staging buffer and copy its contents out
async fn read_staging(device: &GpuDevice, staging: &wgpu::Buffer) -> Result<Vec<u32>> {
    let slice = staging.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device.device().poll(wgpu::Maintain::Wait);
    rx.receive()
        .await
        .context("Failed to receive map result")?
        .context("Buffer mapping failed")?;

    let values = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
    staging.unmap();
    Ok(values)
}

/// Batched GPU relaxation backend
///
/// # Example
///
/// ```ignore
/// # use keyword_distance::{compute_with_fallback, CpuBackend, EngineConfig, ProgressTracker};
/// # use keyword_distance::gpu::GpuBackend;
/// let config = EngineConfig::default();
/// let gpu = GpuBackend::from_config(&config).await?;
/// let cpu = CpuBackend::from_config(&config)?;
/// let matrix = compute_with_fallback(&gpu, &cpu, &graph, &ProgressTracker::silent(0)).await?;
/// ```
#[derive(Debug)]
pub struct GpuBackend {
    device: GpuDevice,
    batches: GpuBatchConfig,
}

impl GpuBackend {
    /// Wrap an initialized device
    #[must_use]
    pub const fn new(device: GpuDevice, batches: GpuBatchConfig) -> Self {
        Self { device, batches }
    }

    /// Acquire the default adapter and size batches from `config`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a bad configuration and `Device` if no
    /// adapter or device is available
    pub async fn from_config(config: &EngineConfig) -> Result<Self, KeywordDistanceError> {
        config.validate()?;
        let device = GpuDevice::new().await?;
        Ok(Self::new(device, config.gpu))
    }

    /// Underlying device
    #[must_use]
    pub const fn device(&self) -> &GpuDevice {
        &self.device
    }

    /// Keywords per batch for `snapshot` on this device
    #[must_use]
    pub fn batch_size(&self, snapshot: &GraphSnapshot) -> usize {
        let vertices = snapshot.num_vertices();
        let requested = self
            .batches
            .batch_size_for(vertices)
            .min(snapshot.keyword_count());
        GpuMemoryLimits::detect(&self.device).clamp_batch(requested, vertices)
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn run_batch(
        &self,
        pipelines: &RelaxPipelines,
        edges: &GpuEdgeBuffers,
        snapshot: &GraphSnapshot,
        keywords: Range<usize>,
    ) -> Result<Vec<KeywordRow>> {
        let num_vertices = snapshot.num_vertices();
        let bitmap = KeywordBitmap::from_snapshot(snapshot, keywords.clone());
        let cells = keywords.len() * num_vertices;
        let params = RelaxParams {
            num_vertices: num_vertices as u32,
            batch_len: keywords.len() as u32,
            words_per_row: bitmap.words_per_row() as u32,
            unreachable: UNREACHABLE,
        };

        let buffers = BatchBuffers::allocate(
            &self.device,
            &params,
            &bitmap,
            (cells * size_of::<u32>()) as u64,
        )
        .await?;

        // After seeding, pair 0 holds the current values; pass p reads pair p % 2
        let result = num_vertices % 2;
        let (groups_x, groups_y) = dispatch_size(cells);
        let queue = self.device.queue();

        self.device
            .validated("keyword distance dispatch", |device| {
                let bind_groups = [
                    buffers.bind_group(device, pipelines, edges, 0),
                    buffers.bind_group(device, pipelines, edges, 1),
                ];

                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Keyword Distance Encoder"),
                });

                {
                    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("Seed Pass"),
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(&pipelines.seed);
                    pass.set_bind_group(0, &bind_groups[1], &[]);
                    pass.dispatch_workgroups(groups_x, groups_y, 1);
                }

                // One pass per compute pass so every pass sees the previous one's writes
                for step in 0..num_vertices {
                    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("Relax Pass"),
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(&pipelines.relax);
                    pass.set_bind_group(0, &bind_groups[step % 2], &[]);
                    pass.dispatch_workgroups(groups_x, groups_y, 1);
                }

                let bytes = buffers.staging_dist.size();
                encoder.copy_buffer_to_buffer(&buffers.dist[result], 0, &buffers.staging_dist, 0, bytes);
                encoder.copy_buffer_to_buffer(&buffers.pred[result], 0, &buffers.staging_pred, 0, bytes);

                queue.submit(Some(encoder.finish()));
            })
            .await?;

        let dist = read_staging(&self.device, &buffers.staging_dist)
            .await
            .context("Reading distances")?;
        let pred = read_staging(&self.device, &buffers.staging_pred)
            .await
            .context("Reading predecessors")?;

        Ok(dist
            .chunks_exact(num_vertices)
            .zip(pred.chunks_exact(num_vertices))
            .map(|(dist, pred)| KeywordRow {
                dist: dist.to_vec(),
                pred: pred.to_vec(),
            })
            .collect())
    }
}

#[async_trait]
impl DistanceMatrixBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    async fn compute(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
    ) -> Result<(), KeywordDistanceError> {
        check_run(snapshot, matrix)?;
        if snapshot.edges().is_empty() {
            return Err(KeywordDistanceError::EmptyEdgeList {
                backend: self.name(),
            });
        }

        let keywords = snapshot.keyword_count();
        let batch_size = self.batch_size(snapshot);
        let num_batches = keywords.div_ceil(batch_size);
        info!(
            adapter = %self.device.info().name,
            batch_size,
            num_batches,
            "starting GPU keyword distance"
        );

        let pipelines = RelaxPipelines::build(&self.device)
            .await
            .map_err(|err| KeywordDistanceError::DeviceProgram {
                message: err.to_string(),
            })?;

        let edges = GpuEdgeBuffers::from_outgoing(&self.device, &snapshot.edges().outgoing())
            .await
            .map_err(|err| KeywordDistanceError::DeviceBuffer {
                batch: 0,
                keywords: 0..keywords,
                message: err.to_string(),
            })?;

        progress.begin(num_batches);
        for batch in 0..num_batches {
            let start = batch * batch_size;
            let range = start..(start + batch_size).min(keywords);

            let rows = self
                .run_batch(&pipelines, &edges, snapshot, range.clone())
                .await
                .map_err(|err| KeywordDistanceError::DeviceBuffer {
                    batch,
                    keywords: range.clone(),
                    message: format!("{err:#}"),
                })?;

            for (keyword, row) in range.clone().zip(&rows) {
                matrix.write_row(keyword, row);
            }
            debug!(batch, keywords = ?range, "batch published");
            progress.increment();
        }

        Ok(())
    }
}
