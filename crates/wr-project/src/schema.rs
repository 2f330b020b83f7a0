//! Scenario schema definitions.

use serde::{Deserialize, Serialize};
use wr_core::InterfaceDof;
use wr_relax::{RelaxationConfig, SweepOrder};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub horizon: HorizonDef,
    /// Penalty coefficient of the Robin exchange on every coupling edge.
    pub penalty: f64,
    #[serde(default)]
    pub strategy: StrategyDef,
    #[serde(default)]
    pub exchange: ExchangeDef,
    #[serde(default)]
    pub integrator: IntegratorDef,
    #[serde(default)]
    pub relaxation: RelaxationConfig,
    #[serde(default)]
    pub partitions: Vec<PartitionDef>,
}

/// Simulated interval and its split into windows. Exactly one of `windows`
/// and `window_length` is given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizonDef {
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_length: Option<f64>,
    pub steps_per_window: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyDef {
    #[default]
    Jacobi,
    GaussSeidel {
        #[serde(default)]
        sweep: SweepOrder,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDef {
    #[default]
    Homogeneous,
    Heterogeneous,
}

/// Newmark parameters; the defaults are the average-acceleration rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntegratorDef {
    pub beta: f64,
    pub gamma: f64,
}

impl Default for IntegratorDef {
    fn default() -> Self {
        Self { beta: 0.25, gamma: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionDef {
    pub name: String,
    pub model: ModelDef,
    /// Overrides `horizon.steps_per_window` for this partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_window: Option<usize>,
    #[serde(default)]
    pub boundaries: Vec<BoundaryDef>,
    #[serde(default)]
    pub interface: Vec<InterfaceDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelDef {
    /// 1D heat conduction on a uniform mesh; dof `i` is node `i`.
    Heat {
        start: f64,
        end: f64,
        elements: usize,
        #[serde(default)]
        material: MaterialDef,
        #[serde(default)]
        initial_temperature: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quadrature_points: Option<usize>,
        #[serde(default)]
        step_halving: bool,
    },
    /// Masses joined by springs, the first tied to ground.
    SpringChain {
        masses: Vec<f64>,
        springs: Vec<f64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        initial_displacement: Vec<f64>,
    },
}

impl ModelDef {
    pub fn dof_count(&self) -> usize {
        match self {
            ModelDef::Heat { elements, .. } => elements + 1,
            ModelDef::SpringChain { masses, .. } => masses.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialDef {
    pub density: f64,
    pub specific_heat: f64,
    pub conductivity: f64,
    /// Relative change of conductivity per unit temperature.
    pub conductivity_slope: f64,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            density: 1.0,
            specific_heat: 1.0,
            conductivity: 1.0,
            conductivity_slope: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryDef {
    Dirichlet { dofs: Vec<usize>, value: f64 },
    Neumann { dofs: Vec<usize>, flux: f64 },
}

impl BoundaryDef {
    pub fn dofs(&self) -> &[usize] {
        match self {
            BoundaryDef::Dirichlet { dofs, .. } | BoundaryDef::Neumann { dofs, .. } => dofs,
        }
    }
}

/// A shared interface dof and the local dof it maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceDef {
    pub dof: InterfaceDof,
    pub local: usize,
}
