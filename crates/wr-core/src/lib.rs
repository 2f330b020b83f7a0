//! wr-core: stable foundation for the waveform relaxation workspace.
//!
//! Contains:
//! - ids (stable compact IDs for partitions, graph vertices/edges, interface dofs)
//! - numeric (uniform time grids)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WrError, WrResult};
pub use ids::*;
pub use numeric::*;
