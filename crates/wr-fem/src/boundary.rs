//! Boundary conditions applied to assembled systems.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assembly::AssembledSystem;
use crate::error::{FemError, FemResult};
use crate::waveform::{Waveform, WaveformKey};

/// Incoming boundary waveforms, keyed by coupling direction.
pub type BoundaryWaveforms = BTreeMap<WaveformKey, Waveform>;

/// Scalar function of time.
pub type TimeFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// How a boundary condition enters the system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryKind {
    /// Prescribed value, imposed as a constraint.
    Dirichlet,
    /// Prescribed flux, added to the load.
    Neumann,
    /// Robin-type condition: `coefficient` is added to the stiffness
    /// diagonal and the source value to the load.
    Penalty { coefficient: f64 },
}

/// Where boundary values come from.
#[derive(Clone)]
pub enum ValueSource {
    Constant(f64),
    Function(TimeFunction),
    /// Supplied by a neighbouring partition. Component `j` of the waveform
    /// feeds the condition's `j`-th dof.
    Coupling(WaveformKey),
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ValueSource::Function(_) => f.write_str("Function(..)"),
            ValueSource::Coupling(key) => f.debug_tuple("Coupling").field(key).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoundaryCondition {
    pub kind: BoundaryKind,
    pub dofs: Vec<usize>,
    pub source: ValueSource,
}

impl BoundaryCondition {
    pub fn dirichlet(dofs: Vec<usize>, value: f64) -> Self {
        Self {
            kind: BoundaryKind::Dirichlet,
            dofs,
            source: ValueSource::Constant(value),
        }
    }

    pub fn neumann(dofs: Vec<usize>, flux: f64) -> Self {
        Self {
            kind: BoundaryKind::Neumann,
            dofs,
            source: ValueSource::Constant(flux),
        }
    }

    /// Penalty condition fed by a neighbour's waveform.
    pub fn coupling(dofs: Vec<usize>, coefficient: f64, key: WaveformKey) -> Self {
        Self {
            kind: BoundaryKind::Penalty { coefficient },
            dofs,
            source: ValueSource::Coupling(key),
        }
    }

    pub fn with_function(mut self, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        self.source = ValueSource::Function(Arc::new(f));
        self
    }

    pub fn is_coupling(&self) -> bool {
        matches!(self.source, ValueSource::Coupling(_))
    }

    pub fn is_dirichlet(&self) -> bool {
        self.kind == BoundaryKind::Dirichlet
    }

    /// Check the condition against a model with `dof_count` dofs.
    pub fn validate(&self, dof_count: usize) -> FemResult<()> {
        if self.dofs.is_empty() {
            return Err(FemError::invalid("boundary condition without dofs"));
        }
        if let Some(&dof) = self.dofs.iter().find(|&&d| d >= dof_count) {
            return Err(FemError::invalid(format!(
                "boundary dof {dof} outside model with {dof_count} dofs"
            )));
        }
        if let BoundaryKind::Penalty { coefficient } = self.kind
            && !(coefficient.is_finite() && coefficient > 0.0)
        {
            return Err(FemError::invalid(format!(
                "penalty coefficient must be positive, got {coefficient}"
            )));
        }
        Ok(())
    }

    /// Boundary values for each dof at `time`.
    pub fn values(&self, time: f64, waveforms: &BoundaryWaveforms) -> FemResult<Vec<f64>> {
        let values = match &self.source {
            ValueSource::Constant(v) => vec![*v; self.dofs.len()],
            ValueSource::Function(f) => vec![f(time); self.dofs.len()],
            ValueSource::Coupling(key) => {
                let waveform = waveforms.get(key).ok_or(FemError::MissingWaveform(*key))?;
                if waveform.width() != self.dofs.len() {
                    return Err(FemError::assembly(format!(
                        "waveform for {key} has {} components, boundary has {} dofs",
                        waveform.width(),
                        self.dofs.len()
                    )));
                }
                waveform.sample(time).iter().copied().collect()
            }
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FemError::NonFinite {
                what: format!("boundary value at t={time}"),
            });
        }
        Ok(values)
    }

    /// Add this condition's contribution to `system`.
    pub fn apply(&self, system: &mut AssembledSystem, waveforms: &BoundaryWaveforms) -> FemResult<()> {
        let values = self.values(system.time, waveforms)?;
        let n = system.dof_count();
        for (&dof, value) in self.dofs.iter().zip(values) {
            if dof >= n {
                return Err(FemError::assembly(format!(
                    "boundary dof {dof} outside system with {n} dofs"
                )));
            }
            match self.kind {
                BoundaryKind::Dirichlet => system.constrain(dof, value),
                BoundaryKind::Neumann => system.load[dof] += value,
                BoundaryKind::Penalty { coefficient } => {
                    system.stiffness[(dof, dof)] += coefficient;
                    system.load[dof] += value;
                }
            }
        }
        Ok(())
    }
}

/// Values prescribed by the Dirichlet conditions among `conditions` at
/// `time`. Conditions fed by missing waveforms are skipped.
pub fn prescribed_values(
    conditions: &[BoundaryCondition],
    time: f64,
    waveforms: &BoundaryWaveforms,
) -> FemResult<Vec<(usize, f64)>> {
    let mut out = Vec::new();
    for bc in conditions.iter().filter(|bc| bc.is_dirichlet()) {
        match bc.values(time, waveforms) {
            Ok(values) => out.extend(bc.dofs.iter().copied().zip(values)),
            Err(FemError::MissingWaveform(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
