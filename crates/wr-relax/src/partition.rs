//! Partitions: independently discretized subdomains.

use std::collections::BTreeMap;

use wr_core::{InterfaceDof, PartitionId};
use wr_fem::TransientModel;

use crate::error::{RelaxError, RelaxResult};

/// A named subdomain owning one transient model.
///
/// `interface` maps the shared interface dofs this partition touches to the
/// model's local dof indices.
#[derive(Debug)]
pub struct Partition {
    id: PartitionId,
    name: String,
    pub model: Box<dyn TransientModel>,
    interface: BTreeMap<InterfaceDof, usize>,
    steps_per_window: Option<usize>,
}

impl Partition {
    pub fn new(
        id: PartitionId,
        name: impl Into<String>,
        model: Box<dyn TransientModel>,
        interface: BTreeMap<InterfaceDof, usize>,
    ) -> RelaxResult<Self> {
        let name = name.into();
        let dofs = model.dof_count();
        if let Some((shared, local)) = interface.iter().find(|(_, local)| **local >= dofs) {
            return Err(RelaxError::invalid(format!(
                "partition '{name}' maps {shared} to local dof {local}, model has {dofs} dofs"
            )));
        }
        Ok(Self {
            id,
            name,
            model,
            interface,
            steps_per_window: None,
        })
    }

    /// Use `steps` time steps per window instead of the sequence default.
    pub fn with_steps_per_window(mut self, steps: usize) -> RelaxResult<Self> {
        if steps == 0 {
            return Err(RelaxError::invalid(format!(
                "partition '{}' needs at least one step per window",
                self.name
            )));
        }
        self.steps_per_window = Some(steps);
        Ok(self)
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> &BTreeMap<InterfaceDof, usize> {
        &self.interface
    }

    pub fn steps_per_window(&self) -> Option<usize> {
        self.steps_per_window
    }

    /// Local dof of a shared interface dof.
    pub fn local_dof(&self, dof: InterfaceDof) -> Option<usize> {
        self.interface.get(&dof).copied()
    }

    /// Interface dofs shared with `other`, ascending.
    pub fn shared_with(&self, other: &Partition) -> Vec<InterfaceDof> {
        self.interface
            .keys()
            .filter(|dof| other.interface.contains_key(dof))
            .copied()
            .collect()
    }
}
