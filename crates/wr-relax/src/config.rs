//! Relaxation settings.

use serde::{Deserialize, Serialize};

use crate::error::{RelaxError, RelaxResult};

/// How per-waveform residuals combine into the iteration residual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualNorm {
    /// Largest per-waveform residual.
    #[default]
    Max,
    /// Square root of the sum of squared per-waveform residuals.
    SumOfSquares,
}

impl ResidualNorm {
    pub fn combine(&self, residuals: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            ResidualNorm::Max => residuals.into_iter().fold(0.0, f64::max),
            ResidualNorm::SumOfSquares => residuals.into_iter().map(|r| r * r).sum::<f64>().sqrt(),
        }
    }
}

/// What a run does when a window hits the iteration cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergencePolicy {
    /// Abort the run.
    Mandatory,
    /// Warn and continue with the last iterate.
    #[default]
    BestEffort,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxationConfig {
    /// Residual below which a window is accepted.
    pub tolerance: f64,
    pub max_iterations: usize,
    pub norm: ResidualNorm,
    pub policy: ConvergencePolicy,
    /// Solve Jacobi iterations on the rayon pool.
    pub parallel: bool,
    /// Constant first-window guess for every interface waveform. Without it
    /// the guess is `penalty * u` from each sender's initial state.
    pub initial_guess: Option<f64>,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
            norm: ResidualNorm::Max,
            policy: ConvergencePolicy::BestEffort,
            parallel: false,
            initial_guess: None,
        }
    }
}

impl RelaxationConfig {
    pub fn validate(&self) -> RelaxResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RelaxError::invalid(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(RelaxError::invalid("max_iterations must be positive"));
        }
        if let Some(guess) = self.initial_guess
            && !guess.is_finite()
        {
            return Err(RelaxError::invalid("initial guess must be finite"));
        }
        Ok(())
    }
}
