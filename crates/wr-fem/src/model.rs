//! Transient model contract and the stepping loop shared by implementations.

use core::fmt;

use crate::assembly::AssembledSystem;
use crate::boundary::{BoundaryCondition, BoundaryWaveforms};
use crate::error::{FemError, FemResult};
use crate::integrator::TimeIntegrator;
use crate::state::{State, StateTrace};

/// Where a model is within the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelPhase {
    /// Freshly reset to a start-of-window state.
    Uninitialized,
    Assembled,
    Stepped,
}

/// A per-partition transient model.
///
/// The dof count is fixed for the model's lifetime. `reset` returns the model
/// to a start-of-window state; after it, `assemble` and `step` with the same
/// inputs give the same results.
pub trait TransientModel: Send + fmt::Debug {
    fn dof_count(&self) -> usize;

    fn is_nonlinear(&self) -> bool {
        false
    }

    fn phase(&self) -> ModelPhase;

    fn boundary_conditions(&self) -> &[BoundaryCondition];

    fn boundary_conditions_mut(&mut self) -> &mut Vec<BoundaryCondition>;

    /// Initial condition at `time`, with Dirichlet values applied.
    fn initial_state(&self, time: f64) -> FemResult<State>;

    /// Current time and state.
    fn time(&self) -> f64;
    fn state(&self) -> &State;

    /// States accepted since the last reset, one per step.
    fn history(&self) -> &[State];

    fn reset(&mut self, time: f64, state: State) -> FemResult<()>;

    /// Build the discrete system at `time` around the current state.
    fn assemble(&mut self, time: f64, waveforms: &BoundaryWaveforms) -> FemResult<AssembledSystem>;

    /// Advance through `grid`, whose first point must be the current time.
    /// The returned trace includes the starting state.
    fn step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        grid: &[f64],
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<StateTrace>;

    /// Number of system assemblies performed so far.
    fn assembly_count(&self) -> usize;
}

/// Bookkeeping common to every model: boundary conditions, current state,
/// accepted history and phase.
#[derive(Clone, Debug)]
pub(crate) struct ModelCore {
    pub conditions: Vec<BoundaryCondition>,
    pub time: f64,
    pub state: State,
    pub history: Vec<State>,
    pub phase: ModelPhase,
    pub assemblies: usize,
    pub step_halving: bool,
}

impl ModelCore {
    pub fn new(state: State) -> Self {
        Self {
            conditions: Vec::new(),
            time: 0.0,
            state,
            history: Vec::new(),
            phase: ModelPhase::Uninitialized,
            assemblies: 0,
            step_halving: false,
        }
    }

    pub fn add_condition(&mut self, condition: BoundaryCondition, dof_count: usize) -> FemResult<()> {
        condition.validate(dof_count)?;
        self.conditions.push(condition);
        Ok(())
    }

    pub fn reset(&mut self, time: f64, state: State) -> FemResult<()> {
        if state.dof_count() != self.state.dof_count() {
            return Err(FemError::invalid(format!(
                "reset state has {} dofs, model has {}",
                state.dof_count(),
                self.state.dof_count()
            )));
        }
        if !time.is_finite() || !state.is_finite() {
            return Err(FemError::NonFinite {
                what: "reset state".to_string(),
            });
        }
        self.time = time;
        self.state = state;
        self.history.clear();
        self.phase = ModelPhase::Uninitialized;
        Ok(())
    }

    /// Apply constant and time-function Dirichlet values to `u`.
    pub fn apply_dirichlet(&self, time: f64, state: &mut State) -> FemResult<()> {
        for (dof, value) in crate::boundary::prescribed_values(&self.conditions, time, &BoundaryWaveforms::new())? {
            state.u[dof] = value;
        }
        Ok(())
    }

    /// Record a completed march.
    pub fn accept(&mut self, trace: &StateTrace) {
        if let (Some(&time), Some(state)) = (trace.times.last(), trace.last()) {
            self.time = time;
            self.state = state.clone();
        }
        self.history.extend(trace.states.iter().skip(1).cloned());
        self.phase = ModelPhase::Stepped;
    }
}

/// One step from `from` to `to`.
pub(crate) trait SingleStep {
    fn single_step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        state: &State,
        from: f64,
        to: f64,
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<State>;
}

/// March `start` through `grid`. With `step_halving`, a step that fails with a
/// retryable error is retried once as two half steps.
pub(crate) fn march<M: SingleStep + ?Sized>(
    model: &mut M,
    integrator: &dyn TimeIntegrator,
    start_time: f64,
    start: &State,
    grid: &[f64],
    waveforms: &BoundaryWaveforms,
    step_halving: bool,
) -> FemResult<StateTrace> {
    let Some(&first) = grid.first() else {
        return Err(FemError::invalid("empty time grid"));
    };
    if (first - start_time).abs() > 1e-12 * start_time.abs().max(1.0) {
        return Err(FemError::invalid(format!(
            "grid starts at {first} but the model is at t={start_time}"
        )));
    }
    if grid.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FemError::invalid("time grid must be strictly increasing"));
    }

    let mut trace = StateTrace::starting_at(first, start.clone());
    let mut current = start.clone();
    for w in grid.windows(2) {
        let (from, to) = (w[0], w[1]);
        let next = match model.single_step(integrator, &current, from, to, waveforms) {
            Ok(next) => next,
            Err(e) if step_halving && e.is_retryable() => {
                tracing::warn!(from, to, error = %e, "step failed, retrying as two half steps");
                let mid = 0.5 * (from + to);
                let half = model.single_step(integrator, &current, from, mid, waveforms)?;
                model.single_step(integrator, &half, mid, to, waveforms)?
            }
            Err(e) => return Err(e),
        };
        trace.push(to, next.clone());
        current = next;
    }
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::Newmark;
    use nalgebra::DVector;

    /// Diverges on any step longer than `limit`; otherwise adds `dt` to `u`.
    struct Fragile {
        limit: f64,
        calls: usize,
    }

    impl SingleStep for Fragile {
        fn single_step(
            &mut self,
            _integrator: &dyn TimeIntegrator,
            state: &State,
            from: f64,
            to: f64,
            _waveforms: &BoundaryWaveforms,
        ) -> FemResult<State> {
            self.calls += 1;
            if to - from > self.limit {
                return Err(FemError::Divergence {
                    time: to,
                    what: "step too long".to_string(),
                });
            }
            Ok(State::at_rest(state.u.add_scalar(to - from)))
        }
    }

    fn start() -> State {
        State::at_rest(DVector::zeros(1))
    }

    #[test]
    fn halving_rescues_a_diverging_step() {
        let mut model = Fragile { limit: 0.3, calls: 0 };
        let none = BoundaryWaveforms::new();
        let trace = march(&mut model, &Newmark::default(), 0.0, &start(), &[0.0, 0.5, 1.0], &none, true).unwrap();
        assert_eq!(trace.times, vec![0.0, 0.5, 1.0]);
        assert!((trace.last().unwrap().u[0] - 1.0).abs() < 1e-15);
        // each step: one failure then two halves
        assert_eq!(model.calls, 6);
    }

    #[test]
    fn without_halving_the_divergence_surfaces() {
        let mut model = Fragile { limit: 0.3, calls: 0 };
        let none = BoundaryWaveforms::new();
        let err = march(&mut model, &Newmark::default(), 0.0, &start(), &[0.0, 0.5], &none, false).unwrap_err();
        assert!(matches!(err, FemError::Divergence { .. }));
    }

    #[test]
    fn halving_is_tried_only_once() {
        let mut model = Fragile { limit: 0.1, calls: 0 };
        let none = BoundaryWaveforms::new();
        let err = march(&mut model, &Newmark::default(), 0.0, &start(), &[0.0, 0.5], &none, true).unwrap_err();
        assert!(matches!(err, FemError::Divergence { .. }));
        assert_eq!(model.calls, 2);
    }

    #[test]
    fn core_reset_clears_history() {
        let mut core = ModelCore::new(State::zeros(2));
        let mut trace = StateTrace::starting_at(0.0, State::zeros(2));
        trace.push(0.1, State::zeros(2));
        core.accept(&trace);
        assert_eq!(core.history.len(), 1);
        assert_eq!(core.phase, ModelPhase::Stepped);

        core.reset(0.0, State::zeros(2)).unwrap();
        assert!(core.history.is_empty());
        assert_eq!(core.phase, ModelPhase::Uninitialized);
        assert!(core.reset(0.0, State::zeros(3)).is_err());
    }
}
