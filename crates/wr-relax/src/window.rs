//! Time windows over the simulation horizon.

use serde::{Deserialize, Serialize};
use wr_core::uniform_grid;

use crate::error::{RelaxError, RelaxResult};

/// A window `[start, end]` sampled with `steps` uniform steps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

impl Window {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Local time grid: `steps + 1` strictly increasing points from `start`
    /// to `end` inclusive.
    pub fn grid(&self) -> RelaxResult<Vec<f64>> {
        Ok(uniform_grid(self.start, self.end, self.steps)?)
    }

    /// Same window with a different resolution.
    pub fn with_steps(&self, steps: usize) -> Window {
        Window { steps, ..*self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Split {
    Count(usize),
    Length(f64),
}

/// Contiguous windows covering `[start, end]`.
///
/// Built from either a window count or a window length; with a length that
/// does not divide the horizon, the last window is shortened to end exactly
/// at `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowSequence {
    start: f64,
    end: f64,
    split: Split,
    steps: usize,
}

impl WindowSequence {
    pub fn with_count(start: f64, end: f64, count: usize, steps: usize) -> RelaxResult<Self> {
        check_horizon(start, end, steps)?;
        if count == 0 {
            return Err(RelaxError::invalid("window count must be positive"));
        }
        Ok(Self {
            start,
            end,
            split: Split::Count(count),
            steps,
        })
    }

    pub fn with_length(start: f64, end: f64, length: f64, steps: usize) -> RelaxResult<Self> {
        check_horizon(start, end, steps)?;
        if !(length.is_finite() && length > 0.0) {
            return Err(RelaxError::InvalidRange {
                what: "window length",
                start: 0.0,
                end: length,
            });
        }
        Ok(Self {
            start,
            end,
            split: Split::Length(length),
            steps,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Steps per window for partitions without their own resolution.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn len(&self) -> usize {
        match self.split {
            Split::Count(n) => n,
            Split::Length(length) => {
                let n = ((self.end - self.start) / length).ceil() as usize;
                // a trailing sliver left by rounding is merged into the previous window
                if n > 1 && self.end - self.boundary(n - 1) <= 1e-6 * length {
                    n - 1
                } else {
                    n.max(1)
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start of window `i`; `boundary(len())` is the horizon end.
    fn boundary(&self, i: usize) -> f64 {
        let t = match self.split {
            Split::Count(n) => {
                if i >= n {
                    return self.end;
                }
                self.start + (self.end - self.start) * (i as f64 / n as f64)
            }
            Split::Length(length) => self.start + length * i as f64,
        };
        t.min(self.end)
    }

    pub fn window(&self, index: usize) -> Option<Window> {
        let count = self.len();
        if index >= count {
            return None;
        }
        let end = if index + 1 == count {
            self.end
        } else {
            self.boundary(index + 1)
        };
        Some(Window {
            index,
            start: self.boundary(index),
            end,
            steps: self.steps,
        })
    }

    /// Lazy iterator over the windows. Each call starts from the first window.
    pub fn windows(&self) -> Windows {
        Windows {
            sequence: *self,
            next: 0,
        }
    }
}

fn check_horizon(start: f64, end: f64, steps: usize) -> RelaxResult<()> {
    if !(start.is_finite() && end.is_finite()) || end <= start {
        return Err(RelaxError::InvalidRange {
            what: "horizon",
            start,
            end,
        });
    }
    if steps == 0 {
        return Err(RelaxError::invalid("steps per window must be positive"));
    }
    Ok(())
}

/// Iterator returned by [`WindowSequence::windows`].
#[derive(Clone, Debug)]
pub struct Windows {
    sequence: WindowSequence,
    next: usize,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let window = self.sequence.window(self.next)?;
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.sequence.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Windows {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_split_is_even() {
        let seq = WindowSequence::with_count(0.0, 1.0, 4, 10).unwrap();
        let windows: Vec<Window> = seq.windows().collect();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[1].start, 0.25);
        assert_eq!(windows[3].end, 1.0);
        assert_eq!(windows[2].grid().unwrap().len(), 11);
    }

    #[test]
    fn grid_finer_than_float_spacing_is_rejected() {
        let window = Window {
            index: 0,
            start: 1e16,
            end: 1e16 + 4.0,
            steps: 4,
        };
        assert!(matches!(
            window.grid(),
            Err(RelaxError::Core(wr_core::WrError::InvalidRange { .. }))
        ));
        assert_eq!(window.with_steps(2).grid().unwrap().len(), 3);
    }

    #[test]
    fn length_split_clamps_last_window() {
        let seq = WindowSequence::with_length(0.0, 1.0, 0.3, 3).unwrap();
        let windows: Vec<Window> = seq.windows().collect();
        assert_eq!(windows.len(), 4);
        assert!((windows[3].start - 0.9).abs() < 1e-12);
        assert_eq!(windows[3].end, 1.0);
    }

    #[test]
    fn exact_length_split_has_no_sliver() {
        let seq = WindowSequence::with_length(0.0, 1.0, 0.25, 2).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.window(3).unwrap().end, 1.0);
    }

    #[test]
    fn iteration_restarts() {
        let seq = WindowSequence::with_count(0.0, 2.0, 3, 1).unwrap();
        let mut it = seq.windows();
        it.next();
        let resumed = it.clone();
        assert_eq!(resumed.len(), 2);
        assert_eq!(seq.windows().count(), 3);
    }

    #[test]
    fn invalid_ranges() {
        assert!(matches!(
            WindowSequence::with_count(1.0, 1.0, 2, 1),
            Err(RelaxError::InvalidRange { .. })
        ));
        assert!(matches!(
            WindowSequence::with_length(0.0, 1.0, 0.0, 1),
            Err(RelaxError::InvalidRange { .. })
        ));
        assert!(matches!(
            WindowSequence::with_length(0.0, 1.0, -0.5, 1),
            Err(RelaxError::InvalidRange { .. })
        ));
        assert!(WindowSequence::with_count(0.0, 1.0, 0, 1).is_err());
        assert!(WindowSequence::with_count(0.0, 1.0, 2, 0).is_err());
    }
}
