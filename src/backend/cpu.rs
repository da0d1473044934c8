//! CPU backend: one relaxation task per keyword on a fixed-size rayon pool
//!
//! Workers never share a keyword row, so the only synchronisation is the
//! per-cell atomic store into the matrix and the progress tracker's lock.
//!
//! The async entry point hands keywords to the pool in waves of one row per
//! worker and yields to the executor between waves. Each wave occupies the
//! polling thread only for its own duration, so other tasks on the same
//! executor (a reader draining finished rows, a progress display) keep
//! running on a `current_thread` runtime. [`CpuBackend::compute_blocking`]
//! runs all keywords in a single wave.

use super::{check_run, DistanceMatrixBackend};
use crate::algorithms::{relax_keyword, GraphSnapshot, KeywordBitmap};
use crate::config::EngineConfig;
use crate::error::KeywordDistanceError;
use crate::matrix::ResultMatrix;
use crate::progress::ProgressTracker;
use async_trait::async_trait;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use tracing::{debug, warn};

/// Parallel CPU relaxation backend
#[derive(Debug)]
pub struct CpuBackend {
    pool: ThreadPool,
}

impl CpuBackend {
    /// Create backend with `worker_threads` workers (0 = one per core)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the thread pool cannot be built
    pub fn new(worker_threads: usize) -> Result<Self, KeywordDistanceError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("keyword-distance-{i}"))
            .build()
            .map_err(|e| KeywordDistanceError::InvalidConfig(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create backend sized by `config.worker_threads`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration or pool is invalid
    pub fn from_config(config: &EngineConfig) -> Result<Self, KeywordDistanceError> {
        config.validate()?;
        Self::new(config.worker_threads)
    }

    /// Number of worker threads
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute on the pool, blocking the calling thread until every row is published
    ///
    /// # Errors
    ///
    /// Returns error if the matrix does not match the snapshot or the edge
    /// weights leave no sentinel headroom
    pub fn compute_blocking(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
    ) -> Result<(), KeywordDistanceError> {
        self.prepare(snapshot, matrix, progress)?;
        self.run_wave(snapshot, matrix, progress, 0..snapshot.keyword_count());
        Ok(())
    }

    fn prepare(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
    ) -> Result<(), KeywordDistanceError> {
        check_run(snapshot, matrix)?;

        if snapshot.edges().is_empty() {
            warn!(
                backend = self.name(),
                "graph has no edges; only keyword holders will be reachable"
            );
        }

        progress.begin(snapshot.keyword_count());
        Ok(())
    }

    fn run_wave(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
        keywords: Range<usize>,
    ) {
        self.pool.install(|| {
            keywords.into_par_iter().for_each(|keyword| {
                let bitmap = KeywordBitmap::from_snapshot(snapshot, keyword..keyword + 1);
                let row = relax_keyword(snapshot.edges(), &bitmap, 0);
                matrix.write_row(keyword, &row);
                debug!(keyword, "keyword row published");
                progress.increment();
            });
        });
    }
}

#[async_trait]
impl DistanceMatrixBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    async fn compute(
        &self,
        snapshot: &GraphSnapshot,
        matrix: &ResultMatrix,
        progress: &ProgressTracker,
    ) -> Result<(), KeywordDistanceError> {
        self.prepare(snapshot, matrix, progress)?;

        let keywords = snapshot.keyword_count();
        let wave = self.num_threads().max(1);
        for start in (0..keywords).step_by(wave) {
            self.run_wave(snapshot, matrix, progress, start..keywords.min(start + wave));
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}
