//! Integration tests for wr-graph.

use proptest::prelude::*;
use wr_core::Id;
use wr_graph::{DotSettings, Graph, GraphError, breadth_first_order};

#[test]
fn ring_of_partitions() {
    // 0 -> 1 -> 2 -> 0
    let mut graph: Graph<String, f64> = Graph::new();
    for i in 0..3 {
        graph.add_vertex(Id::from_index(i), format!("p{i}")).unwrap();
    }
    for i in 0..3 {
        graph
            .add_edge(
                Id::from_index(i),
                Id::from_index(i),
                Id::from_index((i + 1) % 3),
                0.5,
            )
            .unwrap();
    }

    for i in 0..3 {
        let v = Id::from_index(i);
        assert_eq!(graph.vertex(v).unwrap().edges().len(), 2);
        assert_eq!(graph.neighbors(v).unwrap().len(), 2);
        assert_eq!(graph.successors(v).unwrap().len(), 1);
    }

    assert_eq!(breadth_first_order(&graph).len(), 3);
    let dot = graph.to_dot(DotSettings::default());
    assert_eq!(dot.matches("->").count(), 3);
}

#[test]
fn payloads_are_mutable() {
    let mut graph: Graph<u32, u32> = Graph::new();
    graph.add_vertex(Id::from_index(0), 1).unwrap();
    graph.add_vertex(Id::from_index(1), 2).unwrap();
    graph
        .add_edge(Id::from_index(4), Id::from_index(0), Id::from_index(1), 10)
        .unwrap();

    graph.vertex_mut(Id::from_index(0)).unwrap().data += 5;
    graph.edge_mut(Id::from_index(4)).unwrap().data *= 2;

    assert_eq!(graph.vertex(Id::from_index(0)).unwrap().data, 6);
    assert_eq!(graph.edge(Id::from_index(4)).unwrap().data, 20);
    assert_eq!(
        graph.edge_mut(Id::from_index(5)).unwrap_err(),
        GraphError::EdgeNotFound(Id::from_index(5))
    );
}

proptest! {
    #[test]
    fn every_edge_references_existing_vertices(
        vertex_count in 1_u32..20,
        raw_edges in prop::collection::vec((0_u32..25, 0_u32..25), 0..40),
    ) {
        let mut graph: Graph<(), ()> = Graph::new();
        for i in 0..vertex_count {
            graph.add_vertex(Id::from_index(i), ()).unwrap();
        }
        for (k, (a, b)) in raw_edges.iter().enumerate() {
            let result = graph.add_edge(Id::from_index(k as u32), Id::from_index(*a), Id::from_index(*b), ());
            let valid = *a < vertex_count && *b < vertex_count;
            prop_assert_eq!(result.is_ok(), valid);
        }
        for edge in graph.edges() {
            prop_assert!(graph.contains_vertex(edge.source));
            prop_assert!(graph.contains_vertex(edge.target));
        }
        // Breadth-first order visits every vertex exactly once.
        let mut order = breadth_first_order(&graph);
        order.sort();
        order.dedup();
        prop_assert_eq!(order.len(), vertex_count as usize);
    }
}
