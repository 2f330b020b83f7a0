//! Accepted results, window by window.

use std::collections::BTreeMap;

use wr_core::PartitionId;
use wr_fem::{State, StateTrace};

use crate::error::{RelaxError, RelaxResult};
use crate::window::Window;

/// Accepted traces of every partition over one window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSolution {
    pub window: Window,
    pub traces: BTreeMap<PartitionId, StateTrace>,
    pub converged: bool,
}

/// Append-only, window-ordered collection of accepted results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    windows: Vec<WindowSolution>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next window, which must continue where the last one ended.
    pub fn push(&mut self, window: WindowSolution) -> RelaxResult<()> {
        if window.window.index != self.windows.len() {
            return Err(RelaxError::invalid(format!(
                "expected window {}, got {}",
                self.windows.len(),
                window.window.index
            )));
        }
        if let Some(last) = self.windows.last()
            && last.window.end != window.window.start
        {
            return Err(RelaxError::InvalidRange {
                what: "appended window",
                start: window.window.start,
                end: window.window.end,
            });
        }
        self.windows.push(window);
        Ok(())
    }

    pub fn windows(&self) -> &[WindowSolution] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Partitions present in the solution.
    pub fn partitions(&self) -> Vec<PartitionId> {
        self.windows
            .first()
            .map(|w| w.traces.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Whole-horizon trace of one partition. Window start points repeating
    /// the previous window's end are dropped.
    pub fn partition_trace(&self, partition: PartitionId) -> Option<StateTrace> {
        let mut traces = self.windows.iter().filter_map(|w| w.traces.get(&partition));
        let mut joined = traces.next()?.clone();
        for trace in traces {
            for (&t, state) in trace.times.iter().zip(&trace.states).skip(1) {
                joined.push(t, state.clone());
            }
        }
        Some(joined)
    }

    pub fn final_state(&self, partition: PartitionId) -> Option<&State> {
        self.windows.last()?.traces.get(&partition)?.last()
    }

    /// Whether every window converged.
    pub fn all_converged(&self) -> bool {
        self.windows.iter().all(|w| w.converged)
    }
}
