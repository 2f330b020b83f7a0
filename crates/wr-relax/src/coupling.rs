//! Coupling graph payloads and per-partition coupling links.

use wr_core::{EdgeId, InterfaceDof, PartitionId};
use wr_fem::WaveformKey;
use wr_graph::Graph;

use crate::error::{RelaxError, RelaxResult};
use crate::partition::Partition;

/// Vertex payload: the partition's name.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionNode {
    pub name: String,
}

/// Edge payload: the shared interface dofs (ascending) and the penalty
/// coefficient of the Robin exchange across them.
#[derive(Clone, Debug, PartialEq)]
pub struct CouplingEdge {
    pub interface: Vec<InterfaceDof>,
    pub penalty: f64,
}

pub type CouplingGraph = Graph<PartitionNode, CouplingEdge>;

/// One coupling edge seen from one of its partitions.
#[derive(Clone, Debug, PartialEq)]
pub struct CouplingLink {
    pub edge: EdgeId,
    pub neighbor: PartitionId,
    /// Local dofs of the owning partition, in interface order.
    pub local_dofs: Vec<usize>,
    pub penalty: f64,
}

impl CouplingLink {
    /// Key of the waveform arriving over this link.
    pub fn incoming(&self) -> WaveformKey {
        WaveformKey::new(self.edge, self.neighbor)
    }

    /// Key of the waveform `owner` sends over this link.
    pub fn outgoing(&self, owner: PartitionId) -> WaveformKey {
        WaveformKey::new(self.edge, owner)
    }
}

/// Links of `partition`, in edge insertion order.
pub fn links(graph: &CouplingGraph, partition: &Partition) -> RelaxResult<Vec<CouplingLink>> {
    let mut out = Vec::new();
    for edge in graph.incident_edges(partition.id())? {
        let neighbor = edge.other(partition.id()).ok_or_else(|| {
            RelaxError::invalid(format!("edge {} does not touch partition {}", edge.id, partition.id()))
        })?;
        let local_dofs = edge
            .data
            .interface
            .iter()
            .map(|&dof| {
                partition.local_dof(dof).ok_or_else(|| {
                    RelaxError::invalid(format!(
                        "partition {} has no local dof for interface {dof}",
                        partition.id()
                    ))
                })
            })
            .collect::<RelaxResult<Vec<_>>>()?;
        out.push(CouplingLink {
            edge: edge.id,
            neighbor,
            local_dofs,
            penalty: edge.data.penalty,
        });
    }
    Ok(out)
}
