//! Marches relaxation window by window across the horizon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wr_core::PartitionId;
use wr_fem::{BoundaryWaveforms, State};

use crate::cache::SolveCache;
use crate::config::ConvergencePolicy;
use crate::coupling::CouplingGraph;
use crate::error::RelaxResult;
use crate::registry::PartitionRegistry;
use crate::relaxation::{WaveformRelaxation, WindowOutcome};
use crate::solution::Solution;
use crate::window::WindowSequence;

/// Per-window convergence record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
    pub residual_history: Vec<f64>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl From<&WindowOutcome> for WindowSummary {
    fn from(outcome: &WindowOutcome) -> Self {
        Self {
            index: outcome.window.index,
            start: outcome.window.start,
            end: outcome.window.end,
            iterations: outcome.iterations,
            residual: outcome.residual(),
            converged: outcome.converged,
            residual_history: outcome.residual_history.clone(),
            cache_hits: outcome.cache_hits,
            cache_misses: outcome.cache_misses,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub solution: Solution,
    pub windows: Vec<WindowSummary>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl RunReport {
    pub fn all_converged(&self) -> bool {
        self.windows.iter().all(|w| w.converged)
    }

    pub fn total_iterations(&self) -> usize {
        self.windows.iter().map(|w| w.iterations).sum()
    }
}

/// Owns the partitions, their coupling graph and the solve cache for a run.
#[derive(Debug)]
pub struct Orchestrator {
    registry: PartitionRegistry,
    graph: CouplingGraph,
    windows: WindowSequence,
    engine: WaveformRelaxation,
    cache: SolveCache,
}

impl Orchestrator {
    /// Builds the coupling graph, attaching penalty conditions to every
    /// partition.
    pub fn new(
        mut registry: PartitionRegistry,
        windows: WindowSequence,
        engine: WaveformRelaxation,
        penalty: f64,
    ) -> RelaxResult<Self> {
        let graph = registry.build_coupling_graph(penalty)?;
        Ok(Self {
            registry,
            graph,
            windows,
            engine,
            cache: SolveCache::new(),
        })
    }

    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &CouplingGraph {
        &self.graph
    }

    pub fn windows(&self) -> &WindowSequence {
        &self.windows
    }

    pub fn engine(&self) -> &WaveformRelaxation {
        &self.engine
    }

    pub fn cache(&self) -> &SolveCache {
        &self.cache
    }

    /// Relax every window in order.
    ///
    /// Each accepted window's end states start the next window, and its final
    /// waveforms, held at their end values, are the next window's guesses.
    /// Models are left at the end of the last accepted window.
    pub fn run(&mut self) -> RelaxResult<RunReport> {
        let mut solution = Solution::new();
        let mut summaries = Vec::with_capacity(self.windows.len());
        let mut carried: Option<(BTreeMap<PartitionId, State>, BoundaryWaveforms)> = None;

        tracing::info!(
            partitions = self.registry.len(),
            windows = self.windows.len(),
            partitioner = self.engine.partitioner().name(),
            exchange = self.engine.exchange().name(),
            "starting waveform relaxation"
        );

        for window in self.windows.windows() {
            let (states, seeds) = match carried.take() {
                Some(carried) => carried,
                None => self.engine.initial_conditions(&mut self.registry, &self.graph, &window)?,
            };
            let outcome =
                self.engine
                    .solve_window(&mut self.registry, &self.graph, &window, &states, seeds, &self.cache)?;

            if let Some(err) = outcome.convergence_error() {
                match self.engine.config().policy {
                    ConvergencePolicy::Mandatory => return Err(err),
                    ConvergencePolicy::BestEffort => {
                        tracing::warn!(window = window.index, "accepting unconverged window: {err}")
                    }
                }
            }
            tracing::info!(
                window = window.index,
                start = window.start,
                end = window.end,
                iterations = outcome.iterations,
                residual = outcome.residual(),
                "window accepted"
            );

            let finals = outcome.final_states();
            for partition in self.registry.partitions_mut() {
                if let Some(state) = finals.get(&partition.id()) {
                    partition.model.reset(window.end, state.clone())?;
                }
            }
            if let Some(next) = self.windows.window(window.index + 1) {
                let seeds = self.engine.carry_forward(&self.registry, &outcome.waveforms, &next)?;
                carried = Some((finals, seeds));
            }

            summaries.push(WindowSummary::from(&outcome));
            solution.push(outcome.into_solution())?;
        }

        Ok(RunReport {
            solution,
            windows: summaries,
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
        })
    }
}
