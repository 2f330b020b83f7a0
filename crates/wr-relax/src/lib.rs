//! Partitioned transient simulation by waveform relaxation.
//!
//! A [`PartitionRegistry`] owns independently discretized subdomains. The
//! [`Orchestrator`] couples them through a [`CouplingGraph`] and relaxes each
//! time window until the interface waveforms they exchange stop changing.
//! The update order comes from a [`Partitioner`] and grid handling from a
//! [`WaveformExchange`].

pub mod cache;
pub mod config;
pub mod coupling;
pub mod error;
pub mod exchange;
pub mod orchestrator;
pub mod partition;
pub mod partitioner;
pub mod registry;
pub mod relaxation;
pub mod solution;
pub mod window;

pub use cache::{CacheKey, CachedSolve, Fingerprint, SolveCache};
pub use config::{ConvergencePolicy, RelaxationConfig, ResidualNorm};
pub use coupling::{CouplingEdge, CouplingGraph, CouplingLink, PartitionNode, links};
pub use error::{RelaxError, RelaxResult};
pub use exchange::{Heterogeneous, Homogeneous, WaveformExchange};
pub use orchestrator::{Orchestrator, RunReport, WindowSummary};
pub use partition::Partition;
pub use partitioner::{GaussSeidel, Jacobi, Partitioner, Snapshot, SolveTask, SweepOrder};
pub use registry::PartitionRegistry;
pub use relaxation::{RelaxationIterationState, WaveformRelaxation, WindowOutcome};
pub use solution::{Solution, WindowSolution};
pub use window::{Window, WindowSequence, Windows};
