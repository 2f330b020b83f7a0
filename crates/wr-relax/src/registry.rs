//! Partition ownership and coupling-graph construction.

use std::collections::{BTreeMap, HashMap};

use wr_core::{Id, InterfaceDof, PartitionId};
use wr_fem::{BoundaryCondition, TransientModel};

use crate::coupling::{CouplingEdge, CouplingGraph, PartitionNode, links};
use crate::error::{RelaxError, RelaxResult};
use crate::partition::Partition;

/// Owns all partitions in registration order.
#[derive(Debug, Default)]
pub struct PartitionRegistry {
    partitions: Vec<Partition>,
    slots: HashMap<PartitionId, usize>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition under its own id.
    pub fn register(&mut self, partition: Partition) -> RelaxResult<PartitionId> {
        let id = partition.id();
        if self.slots.contains_key(&id) {
            return Err(RelaxError::DuplicatePartition(id));
        }
        self.slots.insert(id, self.partitions.len());
        self.partitions.push(partition);
        Ok(id)
    }

    /// Create and register a partition under the next free id.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        model: Box<dyn TransientModel>,
        interface: BTreeMap<InterfaceDof, usize>,
    ) -> RelaxResult<PartitionId> {
        let partition = Partition::new(self.next_id()?, name, model, interface)?;
        self.register(partition)
    }

    /// Smallest id above every registered one.
    pub fn next_id(&self) -> RelaxResult<PartitionId> {
        let next = self.slots.keys().map(|id| id.index() + 1).max().unwrap_or(0);
        Id::try_from_index(next).ok_or_else(|| RelaxError::invalid("partition ids exhausted"))
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: PartitionId) -> RelaxResult<&Partition> {
        self.slots
            .get(&id)
            .map(|&slot| &self.partitions[slot])
            .ok_or(RelaxError::PartitionNotFound(id))
    }

    pub fn get_mut(&mut self, id: PartitionId) -> RelaxResult<&mut Partition> {
        let slot = *self.slots.get(&id).ok_or(RelaxError::PartitionNotFound(id))?;
        Ok(&mut self.partitions[slot])
    }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<PartitionId> {
        self.partitions.iter().map(Partition::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    pub fn partitions_mut(&mut self) -> &mut [Partition] {
        &mut self.partitions
    }

    /// Build the coupling graph and attach coupling conditions.
    ///
    /// Every pair is inspected in registration order; partitions sharing
    /// interface dofs get one edge from the earlier-registered to the later
    /// one. Edge ids are assigned sequentially, so the same registry always
    /// yields the same graph. Each partition's previous coupling conditions
    /// are replaced by one penalty condition per incident edge.
    pub fn build_coupling_graph(&mut self, penalty: f64) -> RelaxResult<CouplingGraph> {
        if !(penalty.is_finite() && penalty > 0.0) {
            return Err(RelaxError::invalid(format!(
                "coupling penalty must be positive, got {penalty}"
            )));
        }

        let mut graph = CouplingGraph::new();
        for p in &self.partitions {
            graph.add_vertex(
                p.id(),
                PartitionNode {
                    name: p.name().to_string(),
                },
            )?;
        }

        let mut next_edge = 0;
        for (i, a) in self.partitions.iter().enumerate() {
            for b in &self.partitions[i + 1..] {
                let shared = a.shared_with(b);
                if shared.is_empty() {
                    continue;
                }
                graph.add_edge(
                    Id::from_index(next_edge),
                    a.id(),
                    b.id(),
                    CouplingEdge {
                        interface: shared,
                        penalty,
                    },
                )?;
                next_edge += 1;
            }
        }

        for partition in &mut self.partitions {
            let attached = links(&graph, partition)?;
            let conditions = partition.model.boundary_conditions_mut();
            conditions.retain(|bc| !bc.is_coupling());
            for link in &attached {
                let bc = BoundaryCondition::coupling(link.local_dofs.clone(), link.penalty, link.incoming());
                bc.validate(partition.model.dof_count())?;
                partition.model.boundary_conditions_mut().push(bc);
            }
        }

        tracing::debug!(
            partitions = graph.vertex_count(),
            edges = graph.edge_count(),
            "built coupling graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wr_fem::{HeatConductionModel, HeatMaterial, Mesh1d};

    fn bar() -> Box<dyn TransientModel> {
        Box::new(HeatConductionModel::new(Mesh1d::uniform(0.0, 1.0, 4).unwrap(), HeatMaterial::default()).unwrap())
    }

    fn iface(pairs: &[(u64, usize)]) -> BTreeMap<InterfaceDof, usize> {
        pairs.iter().map(|&(g, l)| (InterfaceDof(g), l)).collect()
    }

    #[test]
    fn ids_are_assigned_and_checked() {
        let mut registry = PartitionRegistry::new();
        let a = registry.add("a", bar(), iface(&[])).unwrap();
        let b = registry.add("b", bar(), iface(&[])).unwrap();
        assert_eq!(a, Id::from_index(0));
        assert_eq!(b, Id::from_index(1));

        let dup = Partition::new(a, "again", bar(), iface(&[])).unwrap();
        assert_eq!(registry.register(dup).unwrap_err(), RelaxError::DuplicatePartition(a));
        assert!(registry.get(Id::from_index(7)).unwrap_err().is_not_found());
        assert_eq!(registry.get(b).unwrap().name(), "b");
    }

    #[test]
    fn next_id_fails_once_ids_run_out() {
        let mut registry = PartitionRegistry::new();
        let last = Id::from_index(Id::MAX_INDEX);
        registry.register(Partition::new(last, "last", bar(), iface(&[])).unwrap()).unwrap();
        assert!(matches!(registry.next_id(), Err(RelaxError::InvalidParameters { .. })));
        assert!(registry.add("overflow", bar(), iface(&[])).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn interface_must_map_into_the_model() {
        let mut registry = PartitionRegistry::new();
        assert!(registry.add("a", bar(), iface(&[(1, 5)])).is_err());
    }

    #[test]
    fn rebuild_replaces_coupling_conditions() {
        let mut registry = PartitionRegistry::new();
        let a = registry.add("a", bar(), iface(&[(1, 4)])).unwrap();
        registry.add("b", bar(), iface(&[(1, 0)])).unwrap();

        let first = registry.build_coupling_graph(2.0).unwrap();
        let second = registry.build_coupling_graph(2.0).unwrap();
        assert_eq!(first.edges(), second.edges());
        assert_eq!(first.vertices(), second.vertices());

        let conditions = registry.get(a).unwrap().model.boundary_conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].dofs, vec![4]);
        assert!(conditions[0].is_coupling());
    }

    #[test]
    fn penalty_must_be_positive() {
        let mut registry = PartitionRegistry::new();
        assert!(registry.build_coupling_graph(0.0).is_err());
    }
}
