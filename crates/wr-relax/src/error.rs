//! Error types for partition setup and relaxation.

use thiserror::Error;
use wr_core::{PartitionId, WrError};
use wr_fem::FemError;
use wr_graph::GraphError;

/// Errors raised while building partitions or running relaxation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelaxError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Model error: {0}")]
    Fem(#[from] FemError),

    #[error("Invalid range for {what}: [{start}, {end}]")]
    InvalidRange { what: &'static str, start: f64, end: f64 },

    #[error("Invalid parameters: {what}")]
    InvalidParameters { what: String },

    #[error("Duplicate partition id: {0}")]
    DuplicatePartition(PartitionId),

    #[error("Partition not found: {0}")]
    PartitionNotFound(PartitionId),

    #[error("Window {window} did not converge after {iterations} iterations (residual {residual:e})")]
    Convergence {
        window: usize,
        iterations: usize,
        residual: f64,
    },

    #[error("Partition {partition} failed in window {window}, iteration {iteration}: {source}")]
    Partition {
        partition: PartitionId,
        window: usize,
        iteration: usize,
        #[source]
        source: FemError,
    },

    #[error("Core error: {0}")]
    Core(#[from] WrError),
}

impl RelaxError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        RelaxError::InvalidParameters { what: what.into() }
    }

    pub fn is_duplicate_identity(&self) -> bool {
        match self {
            RelaxError::DuplicatePartition(_) => true,
            RelaxError::Graph(e) => e.is_duplicate_identity(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            RelaxError::PartitionNotFound(_) => true,
            RelaxError::Graph(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type RelaxResult<T> = Result<T, RelaxError>;
