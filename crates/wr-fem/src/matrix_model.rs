//! Linear model given directly by its matrices.

use core::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::assembly::AssembledSystem;
use crate::boundary::{BoundaryCondition, BoundaryWaveforms};
use crate::error::{FemError, FemResult};
use crate::integrator::TimeIntegrator;
use crate::model::{ModelCore, ModelPhase, SingleStep, TransientModel, march};
use crate::state::{State, StateTrace};

/// Time-dependent load vector.
pub type LoadFunction = Arc<dyn Fn(f64) -> DVector<f64> + Send + Sync>;

/// `M u'' + C u' + K u = f(t)`, or `C u' + K u = f(t)` without a mass matrix.
///
/// Covers lumped structural systems such as mass-spring chains.
#[derive(Clone)]
pub struct MatrixModel {
    mass: Option<DMatrix<f64>>,
    damping: DMatrix<f64>,
    stiffness: DMatrix<f64>,
    load: Option<LoadFunction>,
    initial: State,
    core: ModelCore,
}

impl fmt::Debug for MatrixModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixModel")
            .field("dofs", &self.stiffness.nrows())
            .field("second_order", &self.mass.is_some())
            .field("has_load", &self.load.is_some())
            .field("core", &self.core)
            .finish()
    }
}

impl MatrixModel {
    pub fn new(mass: Option<DMatrix<f64>>, damping: DMatrix<f64>, stiffness: DMatrix<f64>) -> FemResult<Self> {
        let n = stiffness.nrows();
        if n == 0 {
            return Err(FemError::invalid("matrix model needs at least one dof"));
        }
        let square = |m: &DMatrix<f64>| m.nrows() == n && m.ncols() == n;
        if !square(&stiffness) || !square(&damping) || !mass.as_ref().is_none_or(square) {
            return Err(FemError::invalid(format!("matrices must all be {n}x{n}")));
        }
        let finite = |m: &DMatrix<f64>| m.iter().all(|x| x.is_finite());
        if !finite(&stiffness) || !finite(&damping) || !mass.as_ref().is_none_or(finite) {
            return Err(FemError::NonFinite {
                what: "model matrix entry".to_string(),
            });
        }
        Ok(Self {
            mass,
            damping,
            stiffness,
            load: None,
            initial: State::zeros(n),
            core: ModelCore::new(State::zeros(n)),
        })
    }

    /// Chain of `masses.len()` masses joined by springs, the first one also
    /// tied to ground. `springs[i]` connects mass `i - 1` (or ground) to mass `i`.
    pub fn spring_chain(masses: &[f64], springs: &[f64]) -> FemResult<Self> {
        let n = masses.len();
        if n == 0 || springs.len() != n {
            return Err(FemError::invalid("spring chain needs one spring per mass"));
        }
        let mut stiffness = DMatrix::zeros(n, n);
        for (i, &k) in springs.iter().enumerate() {
            stiffness[(i, i)] += k;
            if i > 0 {
                stiffness[(i - 1, i - 1)] += k;
                stiffness[(i - 1, i)] -= k;
                stiffness[(i, i - 1)] -= k;
            }
        }
        let mass = DMatrix::from_diagonal(&DVector::from_column_slice(masses));
        Self::new(Some(mass), DMatrix::zeros(n, n), stiffness)
    }

    pub fn with_load(mut self, load: impl Fn(f64) -> DVector<f64> + Send + Sync + 'static) -> Self {
        self.load = Some(Arc::new(load));
        self
    }

    pub fn with_initial_state(mut self, state: State) -> FemResult<Self> {
        if state.dof_count() != self.dof_count() {
            return Err(FemError::invalid(format!(
                "initial state has {} dofs, model has {}",
                state.dof_count(),
                self.dof_count()
            )));
        }
        self.core.state = state.clone();
        self.initial = state;
        Ok(self)
    }

    pub fn with_boundary(mut self, condition: BoundaryCondition) -> FemResult<Self> {
        let n = self.dof_count();
        self.core.add_condition(condition, n)?;
        Ok(self)
    }

    pub fn with_step_halving(mut self, enabled: bool) -> Self {
        self.core.step_halving = enabled;
        self
    }

    fn system_at(&self, time: f64, waveforms: &BoundaryWaveforms) -> FemResult<AssembledSystem> {
        let n = self.dof_count();
        let load = match &self.load {
            Some(f) => f(time),
            None => DVector::zeros(n),
        };
        if load.len() != n {
            return Err(FemError::assembly(format!(
                "load function returned {} values for {n} dofs",
                load.len()
            )));
        }
        let mut system = AssembledSystem {
            time,
            mass: self.mass.clone(),
            damping: self.damping.clone(),
            stiffness: self.stiffness.clone(),
            load,
            constraints: Vec::new(),
        };
        for condition in &self.core.conditions {
            condition.apply(&mut system, waveforms)?;
        }
        Ok(system)
    }
}

impl SingleStep for MatrixModel {
    fn single_step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        state: &State,
        from: f64,
        to: f64,
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<State> {
        self.core.assemblies += 1;
        let system = self.system_at(to, waveforms)?;
        integrator.advance(state, to - from, &system)
    }
}

impl TransientModel for MatrixModel {
    fn dof_count(&self) -> usize {
        self.stiffness.nrows()
    }

    fn phase(&self) -> ModelPhase {
        self.core.phase
    }

    fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.core.conditions
    }

    fn boundary_conditions_mut(&mut self) -> &mut Vec<BoundaryCondition> {
        &mut self.core.conditions
    }

    fn initial_state(&self, time: f64) -> FemResult<State> {
        let mut state = self.initial.clone();
        self.core.apply_dirichlet(time, &mut state)?;
        Ok(state)
    }

    fn time(&self) -> f64 {
        self.core.time
    }

    fn state(&self) -> &State {
        &self.core.state
    }

    fn history(&self) -> &[State] {
        &self.core.history
    }

    fn reset(&mut self, time: f64, state: State) -> FemResult<()> {
        self.core.reset(time, state)
    }

    fn assemble(&mut self, time: f64, waveforms: &BoundaryWaveforms) -> FemResult<AssembledSystem> {
        self.core.assemblies += 1;
        let system = self.system_at(time, waveforms)?;
        self.core.phase = ModelPhase::Assembled;
        Ok(system)
    }

    fn step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        grid: &[f64],
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<StateTrace> {
        let start = self.core.state.clone();
        let (time, halving) = (self.core.time, self.core.step_halving);
        let trace = march(self, integrator, time, &start, grid, waveforms, halving)?;
        self.core.accept(&trace);
        Ok(trace)
    }

    fn assembly_count(&self) -> usize {
        self.core.assemblies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::Newmark;
    use wr_core::uniform_grid;

    #[test]
    fn spring_chain_stiffness() {
        let model = MatrixModel::spring_chain(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        assert_eq!(model.stiffness, DMatrix::from_row_slice(2, 2, &[7.0, -4.0, -4.0, 4.0]));
        assert_eq!(model.dof_count(), 2);
    }

    #[test]
    fn static_load_oscillates_about_equilibrium() {
        // single mass, k = 4, constant load 8: oscillates between 0 and 4
        let newmark = Newmark::default();
        let mut model = MatrixModel::spring_chain(&[1.0], &[4.0])
            .unwrap()
            .with_load(|_| DVector::from_element(1, 8.0));
        let none = BoundaryWaveforms::new();
        let system = model.assemble(0.0, &none).unwrap();
        let start = newmark.initial_rates(model.state(), &system).unwrap();
        assert_eq!(start.a[0], 8.0);
        model.reset(0.0, start).unwrap();

        let trace = model.step(&newmark, &uniform_grid(0.0, 10.0, 2000).unwrap(), &none).unwrap();
        let u = trace.dof_series(0);
        let max = u.iter().cloned().fold(f64::MIN, f64::max);
        let min = u.iter().cloned().fold(f64::MAX, f64::min);
        assert!((max - 4.0).abs() < 1e-2);
        assert!(min.abs() < 1e-12);
    }

    #[test]
    fn dirichlet_holds_a_mass_in_place() {
        let newmark = Newmark::default();
        let mut model = MatrixModel::spring_chain(&[1.0, 1.0], &[1.0, 1.0])
            .unwrap()
            .with_boundary(BoundaryCondition::dirichlet(vec![1], 0.5).with_function(|t| 0.5 * t))
            .unwrap();
        let start = model.initial_state(0.0).unwrap();
        model.reset(0.0, start).unwrap();
        let trace = model
            .step(&newmark, &uniform_grid(0.0, 1.0, 10).unwrap(), &BoundaryWaveforms::new())
            .unwrap();
        for (t, s) in trace.times.iter().zip(&trace.states) {
            assert!((s.u[1] - 0.5 * t).abs() < 1e-12);
        }
        assert!(trace.last().unwrap().u[0] > 0.0);
    }

    #[test]
    fn first_order_without_mass() {
        let model = MatrixModel::new(None, DMatrix::identity(1, 1), DMatrix::identity(1, 1)).unwrap();
        let system = model.system_at(0.0, &BoundaryWaveforms::new()).unwrap();
        assert!(!system.is_second_order());
    }

    #[test]
    fn rejects_mismatched_matrices() {
        assert!(MatrixModel::new(None, DMatrix::zeros(2, 2), DMatrix::zeros(3, 3)).is_err());
        assert!(MatrixModel::new(Some(DMatrix::zeros(1, 1)), DMatrix::zeros(2, 2), DMatrix::zeros(2, 2)).is_err());
        assert!(MatrixModel::spring_chain(&[1.0], &[]).is_err());
    }
}
