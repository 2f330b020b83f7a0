//! Sampled waveforms exchanged across partition interfaces.

use core::fmt;
use nalgebra::DVector;
use wr_core::{EdgeId, PartitionId};

use crate::error::{FemError, FemResult};

/// Identity of one direction of a coupling edge: the waveform `sender`
/// produces on `edge` for the partition at the other end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveformKey {
    pub edge: EdgeId,
    pub sender: PartitionId,
}

impl WaveformKey {
    pub fn new(edge: EdgeId, sender: PartitionId) -> Self {
        Self { edge, sender }
    }
}

impl fmt::Display for WaveformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge {} from partition {}", self.edge, self.sender)
    }
}

/// Vector-valued function of time, stored as samples on a strictly
/// increasing grid and evaluated by piecewise-linear interpolation.
///
/// Outside the sampled interval the end values are held.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    times: Vec<f64>,
    values: Vec<DVector<f64>>,
}

impl Waveform {
    pub fn new(times: Vec<f64>, values: Vec<DVector<f64>>) -> FemResult<Self> {
        if times.is_empty() {
            return Err(FemError::invalid("waveform needs at least one sample"));
        }
        if times.len() != values.len() {
            return Err(FemError::invalid(format!(
                "waveform has {} times but {} samples",
                times.len(),
                values.len()
            )));
        }
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FemError::invalid("waveform times must be strictly increasing"));
        }
        let width = values[0].len();
        if values.iter().any(|v| v.len() != width) {
            return Err(FemError::invalid("waveform samples differ in width"));
        }
        if values.iter().flat_map(|v| v.iter()).any(|x| !x.is_finite()) {
            return Err(FemError::NonFinite {
                what: "waveform sample".to_string(),
            });
        }
        Ok(Self { times, values })
    }

    /// Constant waveform spanning `[start, end]`.
    pub fn constant(start: f64, end: f64, value: DVector<f64>) -> FemResult<Self> {
        if end > start {
            Self::new(vec![start, end], vec![value.clone(), value])
        } else {
            Self::new(vec![start], vec![value])
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[DVector<f64>] {
        &self.values
    }

    /// Number of components per sample.
    pub fn width(&self) -> usize {
        self.values[0].len()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn end_value(&self) -> &DVector<f64> {
        &self.values[self.values.len() - 1]
    }

    /// Evaluate at `time`.
    pub fn sample(&self, time: f64) -> DVector<f64> {
        let n = self.times.len();
        if n == 1 || time <= self.times[0] {
            return self.values[0].clone();
        }
        if time >= self.times[n - 1] {
            return self.values[n - 1].clone();
        }
        // First index with times[i] > time; in 1..n by the checks above.
        let upper = self.times.partition_point(|&t| t <= time);
        let lower = upper - 1;
        let (t0, t1) = (self.times[lower], self.times[upper]);
        let w = (time - t0) / (t1 - t0);
        &self.values[lower] * (1.0 - w) + &self.values[upper] * w
    }

    /// Re-sample onto another grid.
    pub fn resample(&self, grid: &[f64]) -> FemResult<Self> {
        Self::new(grid.to_vec(), grid.iter().map(|&t| self.sample(t)).collect())
    }

    /// Whether the waveform is sampled exactly on `grid`.
    pub fn is_sampled_on(&self, grid: &[f64]) -> bool {
        self.times.as_slice() == grid
    }

    /// Largest component-wise deviation from `other`, measured on this
    /// waveform's grid.
    pub fn max_abs_difference(&self, other: &Waveform) -> f64 {
        self.times
            .iter()
            .zip(&self.values)
            .map(|(&t, value)| (value - other.sample(t)).amax())
            .fold(0.0, f64::max)
    }

    /// The end value held constant over `[start, end]`; seeds the next window.
    pub fn hold_end_value(&self, start: f64, end: f64) -> FemResult<Self> {
        Self::constant(start, end, self.end_value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(times: &[f64], values: &[f64]) -> Waveform {
        Waveform::new(
            times.to_vec(),
            values.iter().map(|&v| DVector::from_element(1, v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn sample_interpolates_and_clamps() {
        let w = scalar(&[0.0, 1.0, 2.0], &[0.0, 10.0, 0.0]);
        assert_eq!(w.sample(0.5)[0], 5.0);
        assert_eq!(w.sample(1.0)[0], 10.0);
        assert_eq!(w.sample(1.5)[0], 5.0);
        assert_eq!(w.sample(-1.0)[0], 0.0);
        assert_eq!(w.sample(3.0)[0], 0.0);
    }

    #[test]
    fn rejects_malformed_samples() {
        assert!(Waveform::new(vec![], vec![]).is_err());
        assert!(Waveform::new(vec![0.0, 0.0], vec![DVector::zeros(1), DVector::zeros(1)]).is_err());
        assert!(Waveform::new(vec![0.0, 1.0], vec![DVector::zeros(1), DVector::zeros(2)]).is_err());
        assert!(Waveform::new(vec![0.0], vec![DVector::from_element(1, f64::NAN)]).is_err());
    }

    #[test]
    fn resample_onto_finer_grid() {
        let coarse = scalar(&[0.0, 1.0], &[0.0, 4.0]);
        let fine = coarse.resample(&[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_eq!(fine.len(), 5);
        assert_eq!(fine.values()[1][0], 1.0);
        assert!(fine.is_sampled_on(&[0.0, 0.25, 0.5, 0.75, 1.0]));
        assert_eq!(coarse.max_abs_difference(&fine), 0.0);
    }

    #[test]
    fn difference_and_hold() {
        let a = scalar(&[0.0, 1.0], &[1.0, 3.0]);
        let b = scalar(&[0.0, 1.0], &[1.0, 2.5]);
        assert_eq!(a.max_abs_difference(&b), 0.5);

        let held = a.hold_end_value(1.0, 2.0).unwrap();
        assert_eq!(held.start(), 1.0);
        assert_eq!(held.end(), 2.0);
        assert_eq!(held.sample(1.7)[0], 3.0);
    }
}
