//! Error types for model assembly and time stepping.

use thiserror::Error;
use wr_core::WrError;

use crate::waveform::WaveformKey;

/// Errors raised while assembling or advancing a transient model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FemError {
    #[error("Assembly error: {what}")]
    Assembly { what: String },

    #[error("Newton iteration diverged at t={time}: {what}")]
    Divergence { time: f64, what: String },

    #[error("Invalid parameters: {what}")]
    InvalidParameters { what: String },

    #[error("No waveform supplied for coupling {0}")]
    MissingWaveform(WaveformKey),

    #[error("Singular system: {what}")]
    Singular { what: String },

    #[error("Non-finite value: {what}")]
    NonFinite { what: String },

    #[error("Core error: {0}")]
    Core(#[from] WrError),
}

impl FemError {
    pub(crate) fn assembly(what: impl Into<String>) -> Self {
        FemError::Assembly { what: what.into() }
    }

    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        FemError::InvalidParameters { what: what.into() }
    }

    /// Whether a smaller time step could plausibly avoid this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FemError::Divergence { .. } | FemError::NonFinite { .. })
    }
}

pub type FemResult<T> = Result<T, FemError>;
