//! Per-partition transient models for waveform relaxation.
//!
//! A model assembles `M a + C v + K u = f` from its discretization and
//! boundary conditions, and marches through a window's time grid with a
//! pluggable [`TimeIntegrator`]. Coupling boundary conditions read their
//! values from incoming [`Waveform`]s keyed by [`WaveformKey`].

pub mod assembly;
pub mod boundary;
pub mod element;
pub mod error;
pub mod heat;
pub mod integrator;
pub mod matrix_model;
pub mod mesh;
pub mod model;
pub mod newton;
pub mod state;
pub mod waveform;

pub use assembly::{AssembledSystem, AssemblyMap};
pub use boundary::{BoundaryCondition, BoundaryKind, BoundaryWaveforms, TimeFunction, ValueSource};
pub use element::{GaussLegendre, LinearLagrange, QuadratureRule, ShapeFunctions};
pub use error::{FemError, FemResult};
pub use heat::{HeatConductionModel, HeatMaterial};
pub use integrator::{Newmark, StepWeights, TimeIntegrator};
pub use matrix_model::{LoadFunction, MatrixModel};
pub use mesh::Mesh1d;
pub use model::{ModelPhase, TransientModel};
pub use newton::{NewtonConfig, NewtonResult};
pub use state::{State, StateTrace};
pub use waveform::{Waveform, WaveformKey};
