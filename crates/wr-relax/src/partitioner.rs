//! Update orderings for one relaxation iteration.

use core::fmt;

use serde::{Deserialize, Serialize};
use wr_core::PartitionId;
use wr_graph::breadth_first_order;

use crate::coupling::CouplingGraph;

/// Which waveforms a solve reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snapshot {
    /// Only the previous iteration's waveforms.
    Previous,
    /// Waveforms already produced in this iteration where available,
    /// otherwise the previous iteration's.
    Freshest,
}

/// One partition solve within an iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveTask {
    pub partition: PartitionId,
    pub snapshot: Snapshot,
}

/// Decides solve order and data visibility within a relaxation iteration.
pub trait Partitioner: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Tasks for `iteration` (1-based) over `partitions` in registration order.
    fn order(&self, graph: &CouplingGraph, partitions: &[PartitionId], iteration: usize) -> Vec<SolveTask>;

    /// Whether the tasks of one iteration are independent of each other.
    fn is_parallel_safe(&self) -> bool;
}

/// All partitions read iteration `k - 1` data.
#[derive(Clone, Copy, Debug, Default)]
pub struct Jacobi;

impl Partitioner for Jacobi {
    fn name(&self) -> &'static str {
        "jacobi"
    }

    fn order(&self, _graph: &CouplingGraph, partitions: &[PartitionId], _iteration: usize) -> Vec<SolveTask> {
        partitions
            .iter()
            .map(|&partition| SolveTask {
                partition,
                snapshot: Snapshot::Previous,
            })
            .collect()
    }

    fn is_parallel_safe(&self) -> bool {
        true
    }
}

/// Sweep order for [`GaussSeidel`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOrder {
    /// Registration order.
    #[default]
    Declared,
    /// Breadth-first over the coupling graph, each component from its lowest id.
    Topological,
}

/// Partitions are solved one after another, each reading the freshest data.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussSeidel {
    pub sweep: SweepOrder,
}

impl GaussSeidel {
    pub fn new(sweep: SweepOrder) -> Self {
        Self { sweep }
    }
}

impl Partitioner for GaussSeidel {
    fn name(&self) -> &'static str {
        "gauss-seidel"
    }

    fn order(&self, graph: &CouplingGraph, partitions: &[PartitionId], _iteration: usize) -> Vec<SolveTask> {
        let order = match self.sweep {
            SweepOrder::Declared => partitions.to_vec(),
            SweepOrder::Topological => {
                let mut order: Vec<PartitionId> = breadth_first_order(graph)
                    .into_iter()
                    .filter(|id| partitions.contains(id))
                    .collect();
                // partitions missing from the graph keep their declared place at the end
                order.extend(partitions.iter().filter(|id| !graph.contains_vertex(**id)));
                order
            }
        };
        order
            .into_iter()
            .map(|partition| SolveTask {
                partition,
                snapshot: Snapshot::Freshest,
            })
            .collect()
    }

    fn is_parallel_safe(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::{CouplingEdge, PartitionNode};
    use wr_core::Id;

    fn chain() -> CouplingGraph {
        // 2 - 0 - 1, registered as [2, 1, 0]
        let mut graph = CouplingGraph::new();
        for i in [2, 1, 0] {
            graph
                .add_vertex(Id::from_index(i), PartitionNode { name: format!("p{i}") })
                .unwrap();
        }
        let edge = || CouplingEdge {
            interface: vec![],
            penalty: 1.0,
        };
        graph
            .add_edge(Id::from_index(0), Id::from_index(2), Id::from_index(0), edge())
            .unwrap();
        graph
            .add_edge(Id::from_index(1), Id::from_index(0), Id::from_index(1), edge())
            .unwrap();
        graph
    }

    fn ids(raw: &[u32]) -> Vec<PartitionId> {
        raw.iter().map(|&i| Id::from_index(i)).collect()
    }

    #[test]
    fn jacobi_reads_previous_data() {
        let tasks = Jacobi.order(&chain(), &ids(&[2, 1, 0]), 1);
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.snapshot == Snapshot::Previous));
        assert!(Jacobi.is_parallel_safe());
    }

    #[test]
    fn gauss_seidel_orders() {
        let declared = GaussSeidel::new(SweepOrder::Declared).order(&chain(), &ids(&[2, 1, 0]), 1);
        let order: Vec<_> = declared.iter().map(|t| t.partition).collect();
        assert_eq!(order, ids(&[2, 1, 0]));
        assert!(declared.iter().all(|t| t.snapshot == Snapshot::Freshest));

        let topo = GaussSeidel::new(SweepOrder::Topological).order(&chain(), &ids(&[2, 1, 0]), 1);
        let order: Vec<_> = topo.iter().map(|t| t.partition).collect();
        assert_eq!(order, ids(&[0, 1, 2]));
        assert!(!GaussSeidel::default().is_parallel_safe());
    }
}
