//! Deterministic traversal orders.

use std::collections::{HashSet, VecDeque};
use wr_core::VertexId;

use crate::graph::Graph;

/// Breadth-first order over the whole graph, ignoring edge direction.
///
/// Each connected component is started from its smallest vertex ID and
/// neighbours are visited in ascending ID order, so the result depends only
/// on the graph's contents.
pub fn breadth_first_order<V, E>(graph: &Graph<V, E>) -> Vec<VertexId> {
    let mut roots: Vec<VertexId> = graph.vertices().iter().map(|v| v.id).collect();
    roots.sort();

    let mut visited: HashSet<VertexId> = HashSet::with_capacity(roots.len());
    let mut order = Vec::with_capacity(roots.len());
    let mut queue = VecDeque::new();

    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            // Every queued ID came from the graph, so lookups cannot miss.
            for next in graph.neighbors(current).unwrap_or_default() {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use wr_core::Id;

    #[test]
    fn chain_is_visited_in_order() {
        let mut graph: Graph<(), ()> = Graph::new();
        for i in [2, 0, 1, 3] {
            graph.add_vertex(Id::from_index(i), ()).unwrap();
        }
        graph
            .add_edge(Id::from_index(0), Id::from_index(2), Id::from_index(1), ())
            .unwrap();
        graph
            .add_edge(Id::from_index(1), Id::from_index(0), Id::from_index(2), ())
            .unwrap();

        let order: Vec<u32> = breadth_first_order(&graph)
            .into_iter()
            .map(|id| id.index())
            .collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn empty_graph() {
        let graph: Graph<(), ()> = Graph::new();
        assert!(breadth_first_order(&graph).is_empty());
    }
}
