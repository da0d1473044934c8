//! Integration tests for keyword-distance
//!
//! End-to-end scenarios: build a keyword graph, compute its matrix on the
//! CPU backend, check cells.

use keyword_distance::{
    compute_matrix, CpuBackend, EngineConfig, KeywordDistanceError, Pair, ProgressTracker,
    ProgressUpdate, ResultMatrix, SparseGraph, UNREACHABLE,
};
use std::sync::{Arc, Mutex};

/// 0 → 1 (w=2), 1 → 2 (w=3); keyword 0 ("A") on vertex 2, keyword 1 ("B") nowhere
fn chain_graph() -> SparseGraph<u32> {
    let mut graph = SparseGraph::with_keyword_count(2);
    for v in 0..3 {
        graph.add_vertex(v).unwrap();
    }
    graph.add_edge(0, 1, 2).unwrap();
    graph.add_edge(1, 2, 3).unwrap();
    graph.add_keyword(2, 0).unwrap();
    graph
}

/// Bidirectional unit-weight path 0 - 1 - 2 - 3 - 4
fn path_graph(keyword_count: usize) -> SparseGraph<u32> {
    let mut graph = SparseGraph::with_keyword_count(keyword_count);
    for v in 0..5 {
        graph.add_vertex(v).unwrap();
    }
    for v in 0..4 {
        graph.add_edge(v, v + 1, 1).unwrap();
        graph.add_edge(v + 1, v, 1).unwrap();
    }
    graph
}

async fn cpu_matrix(graph: &SparseGraph<u32>) -> ResultMatrix {
    let backend = CpuBackend::new(4).unwrap();
    compute_matrix(&backend, graph, &ProgressTracker::silent(0))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_three_vertex_chain() {
    let matrix = cpu_matrix(&chain_graph()).await;

    assert_eq!(matrix.dimensions(), (2, 3));
    assert_eq!(matrix.read(0, 2), Pair { pred: Some(2), dist: 0 });
    assert_eq!(matrix.read(0, 1), Pair { pred: Some(2), dist: 3 });
    assert_eq!(matrix.read(0, 0), Pair { pred: Some(1), dist: 5 });
}

#[tokio::test]
async fn test_keyword_without_holders() {
    let matrix = cpu_matrix(&chain_graph()).await;

    for v in 0..3 {
        let cell = matrix.read(1, v);
        assert_eq!(cell, Pair::UNREACHABLE);
        assert_eq!(cell.dist, UNREACHABLE);
        assert_eq!(cell.pred, None);
        assert!(!cell.is_reachable());
    }
    assert!(matrix.is_row_complete(1));
}

#[tokio::test]
async fn test_two_sources_on_path() {
    let mut graph = path_graph(3);
    graph.add_keywords(0, &[2]).unwrap();
    graph.add_keywords(2, &[2]).unwrap();

    let matrix = cpu_matrix(&graph).await;
    let row = matrix.row(2);

    let dists: Vec<u32> = row.iter().map(|p| p.dist).collect();
    assert_eq!(dists, vec![0, 1, 0, 1, 2]);

    assert_eq!(row[0], Pair::source(0));
    assert_eq!(row[2], Pair::source(2));
    // Vertex 1 is equidistant; its first outgoing edge (to 0) wins the tie
    assert_eq!(row[1].pred, Some(0));
    assert_eq!(row[3].pred, Some(2));
    assert_eq!(row[4].pred, Some(3));
}

#[tokio::test]
async fn test_direction_follows_edges() {
    // 0 → 1 only: vertex 1 holding the keyword does not make 0 reachable from 1's side
    let mut graph: SparseGraph<u32> = SparseGraph::with_keyword_count(1);
    graph.add_vertex(0).unwrap();
    graph.add_vertex(1).unwrap();
    graph.add_edge(0, 1, 4).unwrap();
    graph.add_keyword(0, 0).unwrap();

    let matrix = cpu_matrix(&graph).await;
    assert_eq!(matrix.read(0, 0), Pair::source(0));
    assert_eq!(matrix.read(0, 1), Pair::UNREACHABLE);
}

#[tokio::test]
async fn test_idempotent_runs() {
    let mut graph = path_graph(4);
    graph.add_keyword(4, 0).unwrap();
    graph.add_keywords(1, &[1, 3]).unwrap();
    graph.add_edge(0, 3, 7).unwrap();

    let first = cpu_matrix(&graph).await;
    let second = cpu_matrix(&graph).await;

    assert_eq!(
        first.rows().collect::<Vec<_>>(),
        second.rows().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_removed_vertex_leaves_unreachable_column() {
    let mut graph = path_graph(1);
    graph.add_keyword(0, 0).unwrap();
    graph.remove_vertex(2).unwrap();

    let matrix = cpu_matrix(&graph).await;

    assert_eq!(matrix.dimensions(), (1, 5));
    assert_eq!(matrix.read(0, 1), Pair { pred: Some(0), dist: 1 });
    assert_eq!(matrix.read(0, 2), Pair::UNREACHABLE);
    // 3 and 4 lost their only route through 2
    assert_eq!(matrix.read(0, 3), Pair::UNREACHABLE);
    assert_eq!(matrix.read(0, 4), Pair::UNREACHABLE);
}

#[tokio::test]
async fn test_narrow_vertex_ids() {
    let mut graph: SparseGraph<u8> = SparseGraph::with_keyword_count(2);
    for v in 0..4 {
        graph.add_vertex(v).unwrap();
    }
    graph.add_edge(3, 2, 1).unwrap();
    graph.add_edge(2, 1, 1).unwrap();
    graph.add_edge(3, 1, 5).unwrap();
    graph.add_keyword(1, 1).unwrap();

    let backend = CpuBackend::new(1).unwrap();
    let matrix = compute_matrix(&backend, &graph, &ProgressTracker::silent(0))
        .await
        .unwrap();

    assert_eq!(matrix.read(1, 3), Pair { pred: Some(2), dist: 2 });
    assert_eq!(matrix.row(0), vec![Pair::UNREACHABLE; 4]);
}

#[tokio::test]
async fn test_progress_reports_monotonic_and_done_once() {
    let mut graph = path_graph(8);
    for k in 0..8 {
        graph.add_keyword(k % 5, k).unwrap();
    }

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let sink = Arc::clone(&updates);
    let progress = ProgressTracker::new("keyword matrix", "matrix complete", 0)
        .with_observer(move |update| sink.lock().unwrap().push(update));

    let backend = CpuBackend::new(4).unwrap();
    compute_matrix(&backend, &graph, &progress).await.unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 8);
    assert!(updates.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(updates.iter().filter(|u| u.done).count(), 1);
    assert_eq!(updates.last().map(|u| u.percent), Some(100));
    assert!(progress.is_done());
}

#[test]
fn test_config_rejects_oversized_graph() {
    let config = EngineConfig::new(3, 2, 10);
    assert!(config.check_graph(&chain_graph()).is_ok());

    let mut heavy = chain_graph();
    heavy.add_edge(2, 0, 11).unwrap();
    assert!(matches!(
        config.check_graph(&heavy),
        Err(KeywordDistanceError::InvalidConfig(_))
    ));

    let wide = path_graph(2);
    assert!(config.check_graph(&wide).is_err());
}

#[test]
fn test_matrix_must_match_graph() {
    let graph = chain_graph();
    assert!(ResultMatrix::for_graph(&graph).check_graph(&graph).is_ok());
    assert!(matches!(
        ResultMatrix::new(2, 4).check_graph(&graph),
        Err(KeywordDistanceError::DimensionMismatch { .. })
    ));
}

#[cfg(feature = "storage")]
#[tokio::test]
async fn test_persisted_graph_gives_same_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain");

    let graph = chain_graph();
    graph.write_parquet(&path).await.unwrap();
    let loaded = SparseGraph::<u32>::read_parquet(&path).await.unwrap();

    let before = cpu_matrix(&graph).await;
    let after = cpu_matrix(&loaded).await;
    assert_eq!(
        before.rows().collect::<Vec<_>>(),
        after.rows().collect::<Vec<_>>()
    );
}
