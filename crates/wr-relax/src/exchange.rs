//! How waveforms cross between partitions' time grids.

use core::fmt;
use std::collections::BTreeMap;

use wr_core::PartitionId;
use wr_fem::Waveform;

use crate::error::{RelaxError, RelaxResult};

pub trait WaveformExchange: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Check the partitions' window grids before relaxation starts.
    fn check_grids(&self, grids: &BTreeMap<PartitionId, Vec<f64>>) -> RelaxResult<()>;

    /// Present `waveform` to a partition stepping on `grid`.
    fn incoming(&self, waveform: &Waveform, grid: &[f64]) -> RelaxResult<Waveform>;

    /// Whether the exchange supports sequential (Gauss-Seidel) sweeps.
    fn supports_sequential_sweeps(&self) -> bool;
}

/// All partitions step on the same grid; waveforms pass through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Homogeneous;

impl WaveformExchange for Homogeneous {
    fn name(&self) -> &'static str {
        "homogeneous"
    }

    fn check_grids(&self, grids: &BTreeMap<PartitionId, Vec<f64>>) -> RelaxResult<()> {
        let mut iter = grids.iter();
        let Some((first_id, first)) = iter.next() else {
            return Ok(());
        };
        for (id, grid) in iter {
            if grid != first {
                return Err(RelaxError::invalid(format!(
                    "homogeneous exchange needs identical grids: partition {id} has {} points, partition {first_id} has {}",
                    grid.len(),
                    first.len()
                )));
            }
        }
        Ok(())
    }

    fn incoming(&self, waveform: &Waveform, grid: &[f64]) -> RelaxResult<Waveform> {
        if !waveform.is_sampled_on(grid) {
            return Err(RelaxError::invalid(format!(
                "waveform with {} samples is not on the shared {}-point grid",
                waveform.len(),
                grid.len()
            )));
        }
        Ok(waveform.clone())
    }

    fn supports_sequential_sweeps(&self) -> bool {
        true
    }
}

/// Partitions step on their own grids; incoming waveforms are interpolated
/// onto the consumer's grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct Heterogeneous;

impl WaveformExchange for Heterogeneous {
    fn name(&self) -> &'static str {
        "heterogeneous"
    }

    fn check_grids(&self, _grids: &BTreeMap<PartitionId, Vec<f64>>) -> RelaxResult<()> {
        Ok(())
    }

    fn incoming(&self, waveform: &Waveform, grid: &[f64]) -> RelaxResult<Waveform> {
        if waveform.is_sampled_on(grid) {
            return Ok(waveform.clone());
        }
        Ok(waveform.resample(grid)?)
    }

    // No sequential variant exists for mismatched resolutions.
    fn supports_sequential_sweeps(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use wr_core::Id;

    fn ramp(times: Vec<f64>) -> Waveform {
        let values = times.iter().map(|&t| DVector::from_element(1, t)).collect();
        Waveform::new(times, values).unwrap()
    }

    #[test]
    fn homogeneous_passes_through_or_rejects() {
        let w = ramp(vec![0.0, 0.5, 1.0]);
        assert_eq!(Homogeneous.incoming(&w, &[0.0, 0.5, 1.0]).unwrap(), w);
        assert!(Homogeneous.incoming(&w, &[0.0, 1.0]).is_err());

        let grids = BTreeMap::from([
            (Id::from_index(0), vec![0.0, 1.0]),
            (Id::from_index(1), vec![0.0, 0.5, 1.0]),
        ]);
        assert!(Homogeneous.check_grids(&grids).is_err());
        assert!(Heterogeneous.check_grids(&grids).is_ok());
    }

    #[test]
    fn heterogeneous_interpolates() {
        let coarse = ramp(vec![0.0, 1.0]);
        let fine = Heterogeneous.incoming(&coarse, &[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_eq!(fine.len(), 5);
        assert_eq!(fine.values()[3][0], 0.75);
        assert!(!Heterogeneous.supports_sequential_sweeps());
    }
}
