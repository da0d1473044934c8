//! Property-based tests for keyword-distance
//!
//! Verifies graph index invariants under arbitrary edits and relaxation
//! results against an independent Dijkstra reference.

use keyword_distance::algorithms::{relax_keyword, EdgeList, GraphSnapshot, KeywordBitmap};
use keyword_distance::{CpuBackend, Pair, ProgressTracker, ResultMatrix, SparseGraph, UNREACHABLE};
use proptest::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const KEYWORDS: usize = 6;

#[derive(Debug, Clone)]
enum Edit {
    AddVertex(u16),
    AddEdge(u16, u16, u32),
    AddKeyword(u16, u16),
    RemoveVertex(u16),
    RemoveEdge(u16, u16),
}

fn prop_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (0u16..16).prop_map(Edit::AddVertex),
        3 => (0u16..16, 0u16..16, 0u32..10).prop_map(|(a, b, w)| Edit::AddEdge(a, b, w)),
        2 => (0u16..16, 0u16..8).prop_map(|(v, k)| Edit::AddKeyword(v, k)),
        1 => (0u16..16).prop_map(Edit::RemoveVertex),
        1 => (0u16..16, 0u16..16).prop_map(|(a, b)| Edit::RemoveEdge(a, b)),
    ]
}

/// Random edge triples over `num_vertices` vertices
fn prop_triples(
    num_vertices: usize,
    weights: std::ops::Range<u32>,
) -> impl Strategy<Value = Vec<(u32, u32, u32)>> {
    let bound = num_vertices as u32;
    prop::collection::vec((0..bound, 0..bound, weights), 0..num_vertices * 3)
}

/// Shortest distance from every vertex to any source, following edge direction
fn dijkstra_to_sources(num_vertices: usize, triples: &[(u32, u32, u32)], sources: &[usize]) -> Vec<u32> {
    // Search backwards from the sources over reversed edges
    let mut reversed = vec![Vec::new(); num_vertices];
    for &(a, b, w) in triples {
        reversed[b as usize].push((a as usize, w));
    }

    let mut dist = vec![UNREACHABLE; num_vertices];
    let mut heap = BinaryHeap::new();
    for &s in sources {
        dist[s] = 0;
        heap.push(Reverse((0u32, s)));
    }
    while let Some(Reverse((d, v))) = heap.pop() {
        if d > dist[v] {
            continue;
        }
        for &(u, w) in &reversed[v] {
            let candidate = d + w;
            if candidate < dist[u] {
                dist[u] = candidate;
                heap.push(Reverse((candidate, u)));
            }
        }
    }
    dist
}

fn bitmap_for(num_vertices: usize, sources: &[usize]) -> KeywordBitmap {
    let mut bitmap = KeywordBitmap::new(0..1, num_vertices);
    for &s in sources {
        bitmap.insert(0, s);
    }
    bitmap
}

// Property: membership indexes and edge counts stay consistent under edits
proptest! {
    #[test]
    fn prop_graph_indexes_consistent(edits in prop::collection::vec(prop_edit(), 0..60)) {
        let mut graph: SparseGraph<u16> = SparseGraph::with_keyword_count(KEYWORDS);
        for edit in edits {
            // Rejected edits must leave the graph unchanged; the checks below cover that
            let _ = match edit {
                Edit::AddVertex(v) => graph.add_vertex(v).map(|()| 0),
                Edit::AddEdge(a, b, w) => graph.add_edge(a, b, w).map(|()| 0),
                Edit::AddKeyword(v, k) => graph.add_keyword(v, k).map(usize::from),
                Edit::RemoveVertex(v) => graph.remove_vertex(v).map(|()| 0),
                Edit::RemoveEdge(a, b) => Ok(graph.remove_edge(a, b)),
            };
        }

        let live: Vec<u16> = graph.iter_vertices().collect();
        prop_assert_eq!(graph.num_vertices(), live.len());
        prop_assert_eq!(graph.vertex_bound(), live.last().map_or(0, |&v| usize::from(v) + 1));

        prop_assert_eq!(graph.num_edges(), graph.iter_edges().count());
        for (src, edge) in graph.iter_edges() {
            prop_assert!(graph.vertex_exists(src));
            prop_assert!(graph.vertex_exists(edge.end));
        }

        for &v in &live {
            for k in graph.keywords_of(v) {
                prop_assert!(graph.keyword_is_in(k, v));
                prop_assert!(graph.vertices_with_keyword(k).contains(&v));
            }
        }
        let mut memberships = 0;
        for k in 0..KEYWORDS as u16 {
            for v in graph.vertices_with_keyword(k) {
                prop_assert!(graph.vertex_exists(v));
                prop_assert!(graph.keywords_of(v).contains(&k));
                memberships += 1;
            }
        }
        prop_assert_eq!(graph.num_memberships(), memberships);
    }
}

// Property: relaxed distances equal a Dijkstra reference
proptest! {
    #[test]
    fn prop_relaxation_matches_dijkstra(
        (num_vertices, triples, sources) in (1usize..24).prop_flat_map(|n| (
            Just(n),
            prop_triples(n, 0..10),
            prop::collection::vec(0..n, 0..3),
        ))
    ) {
        let edges = EdgeList::from_triples(num_vertices, &triples);
        let row = relax_keyword(&edges, &bitmap_for(num_vertices, &sources), 0);

        prop_assert_eq!(row.dist, dijkstra_to_sources(num_vertices, &triples, &sources));
    }
}

// Property: walking pred from a reachable vertex reaches a holder in exactly dist weight
proptest! {
    #[test]
    fn prop_pred_walk_reaches_holder(
        (num_vertices, triples, sources) in (1usize..24).prop_flat_map(|n| (
            Just(n),
            prop_triples(n, 1..10),
            prop::collection::vec(0..n, 1..4),
        ))
    ) {
        let edges = EdgeList::from_triples(num_vertices, &triples);
        let snapshot = GraphSnapshot::from_parts(edges, vec![sources.iter().map(|&s| s as u32).collect()]);
        let matrix = ResultMatrix::new(1, num_vertices);
        CpuBackend::new(2)
            .unwrap()
            .compute_blocking(&snapshot, &matrix, &ProgressTracker::silent(0))
            .unwrap();

        for v in 0..num_vertices {
            let Pair { pred, dist } = matrix.read(0, v);
            let Some(mut next) = pred else {
                prop_assert_eq!(dist, UNREACHABLE);
                continue;
            };

            let mut current = v as u32;
            let mut walked = 0u32;
            let mut steps = 0;
            while next != current {
                let remaining = matrix.read(0, current as usize).dist - matrix.read(0, next as usize).dist;
                prop_assert!(
                    triples.iter().any(|&(a, b, w)| a == current && b == next && w == remaining),
                    "no edge {} -> {} of weight {}", current, next, remaining
                );
                walked += remaining;
                current = next;
                next = matrix.read(0, current as usize).pred.unwrap_or(current);
                steps += 1;
                prop_assert!(steps <= num_vertices);
            }

            prop_assert!(sources.contains(&(current as usize)));
            prop_assert_eq!(walked, dist);
        }
    }
}

// Property: a keyword nobody holds yields an all-unreachable row
proptest! {
    #[test]
    fn prop_zero_source_rows_unreachable(
        (num_vertices, triples) in (1usize..24).prop_flat_map(|n| (Just(n), prop_triples(n, 0..10)))
    ) {
        let edges = EdgeList::from_triples(num_vertices, &triples);
        let snapshot = GraphSnapshot::from_parts(edges, vec![vec![0], vec![]]);
        let matrix = ResultMatrix::new(2, num_vertices);
        CpuBackend::new(1)
            .unwrap()
            .compute_blocking(&snapshot, &matrix, &ProgressTracker::silent(0))
            .unwrap();

        prop_assert_eq!(matrix.read(0, 0), Pair::source(0));
        prop_assert_eq!(matrix.row(1), vec![Pair::UNREACHABLE; num_vertices]);
    }
}
