//! Time integrators.
//!
//! An integrator advances `M a + C v + K u = f` by one step. Each step
//! solves for a single unknown vector `x` (the new acceleration for
//! second-order systems, the new rate for first-order ones) and recovers the
//! new state as `predicted + weights * x`.

use core::fmt;
use nalgebra::{DMatrix, DVector};

use crate::assembly::AssembledSystem;
use crate::error::{FemError, FemResult};
use crate::state::State;

/// How the step unknown feeds back into `u`, `v` and `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepWeights {
    pub u: f64,
    pub v: f64,
    pub a: f64,
    pub second_order: bool,
}

pub trait TimeIntegrator: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Weights for a step of size `dt`.
    fn weights(&self, dt: f64, second_order: bool) -> FemResult<StepWeights>;

    /// Part of the next state known before solving.
    fn predict(&self, state: &State, dt: f64, second_order: bool) -> State;

    fn correct(&self, predicted: &State, unknown: &DVector<f64>, weights: StepWeights) -> State {
        State {
            u: &predicted.u + unknown * weights.u,
            v: &predicted.v + unknown * weights.v,
            a: &predicted.a + unknown * weights.a,
        }
    }

    /// The step unknown carried by a state.
    fn unknown(&self, state: &State, second_order: bool) -> DVector<f64> {
        if second_order {
            state.a.clone()
        } else {
            state.v.clone()
        }
    }

    /// `w_a M + w_v C + w_u K`.
    fn effective_matrix(&self, system: &AssembledSystem, weights: StepWeights) -> DMatrix<f64> {
        let mut a = &system.damping * weights.v + &system.stiffness * weights.u;
        if let Some(mass) = &system.mass {
            a += mass * weights.a;
        }
        a
    }

    /// Advance `state` by `dt` against a system assembled at the end of the step.
    fn advance(&self, state: &State, dt: f64, system: &AssembledSystem) -> FemResult<State> {
        system.check_dimensions()?;
        let second_order = system.is_second_order();
        let weights = self.weights(dt, second_order)?;
        let predicted = self.predict(state, dt, second_order);

        let mut matrix = self.effective_matrix(system, weights);
        let mut rhs = &system.load - &system.damping * &predicted.v - &system.stiffness * &predicted.u;
        if let Some(mass) = &system.mass {
            rhs -= mass * &predicted.a;
        }
        for &(dof, value) in &system.constraints {
            replace_row(&mut matrix, dof);
            rhs[dof] = (value - predicted.u[dof]) / weights.u;
        }

        let unknown = solve(matrix, rhs, system.time)?;
        let next = self.correct(&predicted, &unknown, weights);
        if !next.is_finite() {
            return Err(FemError::NonFinite {
                what: format!("state after step to t={}", system.time),
            });
        }
        Ok(next)
    }

    /// Rates consistent with `state` and `system`: solves `M a = f - C v - K u`
    /// for second-order systems or `C v = f - K u` for first-order ones.
    /// Constrained dofs get a zero rate.
    fn initial_rates(&self, state: &State, system: &AssembledSystem) -> FemResult<State> {
        system.check_dimensions()?;
        let mut next = state.clone();
        let rhs = &system.load - &system.stiffness * &state.u;
        let (mut matrix, mut rhs) = match &system.mass {
            Some(mass) => (mass.clone(), rhs - &system.damping * &state.v),
            None => (system.damping.clone(), rhs),
        };
        for &(dof, _) in &system.constraints {
            replace_row(&mut matrix, dof);
            rhs[dof] = 0.0;
        }
        let rates = solve(matrix, rhs, system.time)?;
        match system.mass {
            Some(_) => next.a = rates,
            None => {
                next.v = rates;
                next.a.fill(0.0);
            }
        }
        Ok(next)
    }
}

/// Residual of `M a + C v + K u - f` at `state`, with constrained rows
/// replaced by the scaled constraint violation `(u_i - g_i) / w_u`.
pub fn equilibrium_residual(system: &AssembledSystem, state: &State, weights: StepWeights) -> DVector<f64> {
    let mut r = &system.damping * &state.v + &system.stiffness * &state.u - &system.load;
    if let Some(mass) = &system.mass {
        r += mass * &state.a;
    }
    for &(dof, value) in &system.constraints {
        r[dof] = (state.u[dof] - value) / weights.u;
    }
    r
}

fn replace_row(matrix: &mut DMatrix<f64>, row: usize) {
    matrix.row_mut(row).fill(0.0);
    matrix[(row, row)] = 1.0;
}

fn solve(matrix: DMatrix<f64>, rhs: DVector<f64>, time: f64) -> FemResult<DVector<f64>> {
    matrix.lu().solve(&rhs).ok_or_else(|| FemError::Singular {
        what: format!("effective matrix at t={time}"),
    })
}

/// Newmark-beta family.
///
/// Second-order systems use the classical predictor/corrector on the
/// acceleration. First-order systems use the `gamma` part alone, which is the
/// generalized trapezoidal rule (Crank-Nicolson at `gamma = 0.5`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Newmark {
    beta: f64,
    gamma: f64,
}

impl Newmark {
    /// Fails unless `gamma >= 1/2` and `beta >= (gamma + 1/2)^2 / 4`.
    pub fn new(beta: f64, gamma: f64) -> FemResult<Self> {
        if !(beta.is_finite() && gamma.is_finite()) {
            return Err(FemError::invalid("Newmark parameters must be finite"));
        }
        if gamma < 0.5 {
            return Err(FemError::invalid(format!(
                "Newmark gamma must be at least 0.5, got {gamma}"
            )));
        }
        let beta_min = 0.25 * (gamma + 0.5).powi(2);
        if beta < beta_min {
            return Err(FemError::invalid(format!(
                "Newmark beta must be at least {beta_min} for gamma={gamma}, got {beta}"
            )));
        }
        Ok(Self { beta, gamma })
    }

    /// Trapezoidal rule, `beta = 1/4`, `gamma = 1/2`.
    pub fn average_acceleration() -> Self {
        Self {
            beta: 0.25,
            gamma: 0.5,
        }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for Newmark {
    fn default() -> Self {
        Self::average_acceleration()
    }
}

impl TimeIntegrator for Newmark {
    fn name(&self) -> &'static str {
        "newmark"
    }

    fn weights(&self, dt: f64, second_order: bool) -> FemResult<StepWeights> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(FemError::invalid(format!("time step must be positive, got {dt}")));
        }
        Ok(if second_order {
            StepWeights {
                u: self.beta * dt * dt,
                v: self.gamma * dt,
                a: 1.0,
                second_order,
            }
        } else {
            StepWeights {
                u: self.gamma * dt,
                v: 1.0,
                a: 0.0,
                second_order,
            }
        })
    }

    fn predict(&self, state: &State, dt: f64, second_order: bool) -> State {
        let n = state.dof_count();
        if second_order {
            State {
                u: &state.u + &state.v * dt + &state.a * (0.5 * dt * dt * (1.0 - 2.0 * self.beta)),
                v: &state.v + &state.a * (dt * (1.0 - self.gamma)),
                a: DVector::zeros(n),
            }
        } else {
            State {
                u: &state.u + &state.v * (dt * (1.0 - self.gamma)),
                v: DVector::zeros(n),
                a: DVector::zeros(n),
            }
        }
    }
}
