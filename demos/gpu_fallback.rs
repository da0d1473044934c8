//! GPU keyword distance with CPU fallback
//!
//! Run with: RUST_LOG=keyword_distance=debug cargo run --example gpu_fallback --features gpu

use keyword_distance::gpu::GpuBackend;
use keyword_distance::{
    compute_matrix, compute_with_fallback, CpuBackend, EngineConfig, ProgressTracker,
    SparseGraph,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("keyword_distance=info")),
        )
        .init();

    println!("🦀 keyword-distance GPU example\n");

    let config = EngineConfig::new(1_000, 16, 10);
    config.validate()?;

    // Ring with chords; keyword k held by every vertex congruent to k mod 97
    let mut graph: SparseGraph<u32> = SparseGraph::with_keyword_count(config.keyword_count);
    for v in 0..1_000 {
        graph.add_vertex(v)?;
    }
    for v in 0..1_000 {
        graph.add_edge(v, (v + 1) % 1_000, 1 + v % 7)?;
        graph.add_edge(v, (v * 31 + 17) % 1_000, 10)?;
    }
    for k in 0..16 {
        for v in (k..1_000).step_by(97) {
            graph.add_keyword(v, k)?;
        }
    }

    let cpu = CpuBackend::from_config(&config)?;
    let progress = ProgressTracker::new("keyword matrix", "matrix complete", 0);

    let matrix = match GpuBackend::from_config(&config).await {
        Ok(gpu) => {
            println!("🎮 GPU: {}", gpu.device().info().name);
            compute_with_fallback(&gpu, &cpu, &graph, &progress).await?
        }
        Err(e) => {
            println!("⚠️  GPU unavailable ({e}), using CPU");
            compute_matrix(&cpu, &graph, &progress).await?
        }
    };

    let reachable = matrix
        .rows()
        .flatten()
        .filter(|cell| cell.is_reachable())
        .count();
    let (keywords, vertices) = matrix.dimensions();
    println!("✅ {reachable} of {} cells reachable", keywords * vertices);

    Ok(())
}
