//! Keyword distance matrix on the CPU backend
//!
//! Run with: RUST_LOG=keyword_distance=debug cargo run --example keyword_matrix

use keyword_distance::{
    compute_matrix, CpuBackend, EngineConfig, ProgressTracker, SparseGraph,
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

    println!("🦀 keyword-distance example\n");

    // 1. Build a small road network; keywords mark amenities
    const CAFE: u32 = 0;
    const FUEL: u32 = 1;
    const PARKING: u32 = 2;

    println!("📊 Building graph...");
    let config = EngineConfig::new(6, 3, 10).with_worker_threads(2);
    config.validate()?;

    let mut graph: SparseGraph<u32> = SparseGraph::with_keyword_count(config.keyword_count);
    for v in 0..6 {
        graph.add_vertex(v)?;
    }
    for (a, b, w) in [(0, 1, 4), (1, 2, 2), (2, 3, 3), (3, 4, 1), (4, 5, 6), (5, 0, 2), (1, 4, 7)] {
        graph.add_edge(a, b, w)?;
        graph.add_edge(b, a, w)?;
    }
    graph.add_keyword(2, CAFE)?;
    graph.add_keywords(5, &[CAFE, FUEL])?;
    config.check_graph(&graph)?;

    println!(
        "  ✅ {} vertices, {} edges, {} memberships\n",
        graph.num_vertices(),
        graph.num_edges(),
        graph.num_memberships()
    );
    print!("{graph}");

    // 2. Compute the matrix
    println!("\n⚙️  Computing matrix...");
    let backend = CpuBackend::from_config(&config)?;
    let progress = ProgressTracker::new("keyword matrix", "matrix complete", 0)
        .with_observer(|update| println!("  {:>3}% ({}/{})", update.percent, update.completed, update.total));
    let matrix = compute_matrix(&backend, &graph, &progress).await?;

    // 3. Print one row per keyword
    println!("\n📍 Nearest amenity (distance via next hop):");
    for (keyword, name) in [(CAFE, "cafe"), (FUEL, "fuel"), (PARKING, "parking")] {
        let cells: Vec<String> = matrix
            .row(keyword as usize)
            .iter()
            .map(|cell| match (cell.distance(), cell.pred) {
                (Some(dist), Some(pred)) => format!("{dist:>2} via {pred}"),
                _ => "   --   ".to_string(),
            })
            .collect();
        println!("  {name:<8} | {}", cells.join(" | "));
    }

    println!("\n✅ {} of {} rows complete", matrix.completed_rows(), matrix.dimensions().0);
    Ok(())
}
