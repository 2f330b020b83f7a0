//! Model state and state traces.

use nalgebra::DVector;

/// Kinematic state of a model at one instant.
///
/// `u` holds the primary field (temperature, displacement), `v` its first and
/// `a` its second time derivative. First-order models keep `a` at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub u: DVector<f64>,
    pub v: DVector<f64>,
    pub a: DVector<f64>,
}

impl State {
    pub fn zeros(dofs: usize) -> Self {
        Self {
            u: DVector::zeros(dofs),
            v: DVector::zeros(dofs),
            a: DVector::zeros(dofs),
        }
    }

    /// State at rest with the given primary field.
    pub fn at_rest(u: DVector<f64>) -> Self {
        let dofs = u.len();
        Self {
            u,
            v: DVector::zeros(dofs),
            a: DVector::zeros(dofs),
        }
    }

    pub fn dof_count(&self) -> usize {
        self.u.len()
    }

    pub fn is_finite(&self) -> bool {
        self.u
            .iter()
            .chain(self.v.iter())
            .chain(self.a.iter())
            .all(|x| x.is_finite())
    }
}

/// States sampled on a strictly increasing time grid.
#[derive(Clone, Debug, PartialEq)]
pub struct StateTrace {
    pub times: Vec<f64>,
    pub states: Vec<State>,
}

impl StateTrace {
    /// Trace holding only the starting point.
    pub fn starting_at(time: f64, state: State) -> Self {
        Self {
            times: vec![time],
            states: vec![state],
        }
    }

    pub fn push(&mut self, time: f64, state: State) {
        self.times.push(time);
        self.states.push(state);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    /// Time history of one primary-field dof.
    pub fn dof_series(&self, dof: usize) -> Vec<f64> {
        self.states.iter().map(|s| s.u[dof]).collect()
    }

    /// Primary-field values of several dofs at every sample.
    pub fn sample_dofs(&self, dofs: &[usize]) -> Vec<DVector<f64>> {
        self.states
            .iter()
            .map(|s| DVector::from_iterator(dofs.len(), dofs.iter().map(|&d| s.u[d])))
            .collect()
    }
}
