//! The waveform relaxation loop for one window.

use std::collections::BTreeMap;
use std::sync::Arc;

use nalgebra::DVector;
use rayon::prelude::*;
use wr_core::PartitionId;
use wr_fem::{BoundaryWaveforms, FemError, FemResult, State, StateTrace, TimeIntegrator, Waveform, WaveformKey};

use crate::cache::{CacheKey, CachedSolve, Fingerprint, SolveCache};
use crate::config::RelaxationConfig;
use crate::coupling::{CouplingGraph, CouplingLink, links};
use crate::error::{RelaxError, RelaxResult};
use crate::exchange::WaveformExchange;
use crate::partition::Partition;
use crate::partitioner::{Partitioner, Snapshot};
use crate::registry::PartitionRegistry;
use crate::solution::WindowSolution;
use crate::window::Window;

/// Progress of the relaxation loop within one window.
#[derive(Clone, Debug, PartialEq)]
pub struct RelaxationIterationState {
    /// Completed iterations.
    pub iteration: usize,
    /// Waveforms produced by the last completed iteration.
    pub snapshot: BoundaryWaveforms,
    /// Residual after each completed iteration.
    pub residuals: Vec<f64>,
    pub converged: bool,
}

impl RelaxationIterationState {
    pub fn new(seeds: BoundaryWaveforms) -> Self {
        Self {
            iteration: 0,
            snapshot: seeds,
            residuals: Vec::new(),
            converged: false,
        }
    }

    pub fn residual(&self) -> Option<f64> {
        self.residuals.last().copied()
    }
}

/// Result of relaxing one window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowOutcome {
    pub window: Window,
    /// Last iterate of every partition, on its own grid.
    pub traces: BTreeMap<PartitionId, StateTrace>,
    /// Waveforms of the last iterate.
    pub waveforms: BoundaryWaveforms,
    pub iterations: usize,
    pub residual_history: Vec<f64>,
    pub converged: bool,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl WindowOutcome {
    /// Final residual; zero when no iteration produced a waveform.
    pub fn residual(&self) -> f64 {
        self.residual_history.last().copied().unwrap_or(0.0)
    }

    /// The error a mandatory-convergence run reports for this window.
    pub fn convergence_error(&self) -> Option<RelaxError> {
        (!self.converged).then(|| RelaxError::Convergence {
            window: self.window.index,
            iterations: self.iterations,
            residual: self.residual(),
        })
    }

    /// End-of-window state of every partition.
    pub fn final_states(&self) -> BTreeMap<PartitionId, State> {
        self.traces
            .iter()
            .filter_map(|(&id, trace)| trace.last().map(|s| (id, s.clone())))
            .collect()
    }

    pub fn into_solution(self) -> WindowSolution {
        WindowSolution {
            window: self.window,
            traces: self.traces,
            converged: self.converged,
        }
    }
}

/// Everything a partition solve reads that is fixed for the window.
struct WindowContext<'a> {
    window: &'a Window,
    grids: &'a BTreeMap<PartitionId, Vec<f64>>,
    links: &'a BTreeMap<PartitionId, Vec<CouplingLink>>,
    initial_states: &'a BTreeMap<PartitionId, State>,
    cache: &'a SolveCache,
}

struct PartitionSolve {
    partition: PartitionId,
    solve: Arc<CachedSolve>,
    cached: bool,
}

/// Relaxes partitions against each other until their interface waveforms
/// stop changing.
#[derive(Debug)]
pub struct WaveformRelaxation {
    partitioner: Box<dyn Partitioner>,
    exchange: Box<dyn WaveformExchange>,
    integrator: Box<dyn TimeIntegrator>,
    config: RelaxationConfig,
}

impl WaveformRelaxation {
    pub fn new(
        partitioner: Box<dyn Partitioner>,
        exchange: Box<dyn WaveformExchange>,
        integrator: Box<dyn TimeIntegrator>,
        config: RelaxationConfig,
    ) -> RelaxResult<Self> {
        config.validate()?;
        if !partitioner.is_parallel_safe() && !exchange.supports_sequential_sweeps() {
            return Err(RelaxError::invalid(format!(
                "{} exchange does not support {} sweeps",
                exchange.name(),
                partitioner.name()
            )));
        }
        Ok(Self {
            partitioner,
            exchange,
            integrator,
            config,
        })
    }

    pub fn config(&self) -> &RelaxationConfig {
        &self.config
    }

    pub fn partitioner(&self) -> &dyn Partitioner {
        self.partitioner.as_ref()
    }

    pub fn exchange(&self) -> &dyn WaveformExchange {
        self.exchange.as_ref()
    }

    pub fn integrator(&self) -> &dyn TimeIntegrator {
        self.integrator.as_ref()
    }

    /// Each partition's step grid over `window`.
    pub fn grids(&self, registry: &PartitionRegistry, window: &Window) -> RelaxResult<BTreeMap<PartitionId, Vec<f64>>> {
        registry
            .iter()
            .map(|p| {
                let steps = p.steps_per_window().unwrap_or(window.steps);
                Ok((p.id(), window.with_steps(steps).grid()?))
            })
            .collect()
    }

    /// Start-of-run states and first-window interface guesses.
    ///
    /// Each model starts from its initial condition with rates made
    /// consistent with the system assembled under the guessed waveforms.
    pub fn initial_conditions(
        &self,
        registry: &mut PartitionRegistry,
        graph: &CouplingGraph,
        window: &Window,
    ) -> RelaxResult<(BTreeMap<PartitionId, State>, BoundaryWaveforms)> {
        let grids = self.grids(registry, window)?;
        let mut states = BTreeMap::new();
        let mut seeds = BoundaryWaveforms::new();
        for partition in registry.iter() {
            let id = partition.id();
            let state = partition.model.initial_state(window.start)?;
            let grid = &grids[&id];
            for link in links(graph, partition)? {
                let value = match self.config.initial_guess {
                    Some(guess) => DVector::from_element(link.local_dofs.len(), guess),
                    None => DVector::from_iterator(
                        link.local_dofs.len(),
                        link.local_dofs.iter().map(|&dof| link.penalty * state.u[dof]),
                    ),
                };
                seeds.insert(link.outgoing(id), Waveform::new(grid.clone(), vec![value; grid.len()])?);
            }
            states.insert(id, state);
        }

        for partition in registry.partitions_mut() {
            let id = partition.id();
            let Some(state) = states.remove(&id) else {
                continue;
            };
            partition.model.reset(window.start, state)?;
            let system = partition.model.assemble(window.start, &seeds)?;
            let consistent = self.integrator.initial_rates(partition.model.state(), &system)?;
            states.insert(id, consistent);
        }
        Ok((states, seeds))
    }

    /// Guesses for `next`: each final waveform's end value held over the
    /// sender's grid in the next window.
    pub fn carry_forward(
        &self,
        registry: &PartitionRegistry,
        waveforms: &BoundaryWaveforms,
        next: &Window,
    ) -> RelaxResult<BoundaryWaveforms> {
        let grids = self.grids(registry, next)?;
        waveforms
            .iter()
            .map(|(&key, waveform)| {
                let grid = grids.get(&key.sender).ok_or(RelaxError::PartitionNotFound(key.sender))?;
                let held = waveform.hold_end_value(next.start, next.end)?.resample(grid)?;
                Ok((key, held))
            })
            .collect()
    }

    /// Relax `window` starting from `seeds`.
    ///
    /// Iterates until the residual drops to the tolerance or the iteration
    /// cap is reached; a capped window is returned with `converged` false.
    pub fn solve_window(
        &self,
        registry: &mut PartitionRegistry,
        graph: &CouplingGraph,
        window: &Window,
        initial_states: &BTreeMap<PartitionId, State>,
        seeds: BoundaryWaveforms,
        cache: &SolveCache,
    ) -> RelaxResult<WindowOutcome> {
        let grids = self.grids(registry, window)?;
        self.exchange.check_grids(&grids)?;

        let mut partition_links = BTreeMap::new();
        for partition in registry.iter() {
            let attached = links(graph, partition)?;
            for link in &attached {
                let key = link.outgoing(partition.id());
                if !seeds.contains_key(&key) {
                    return Err(FemError::MissingWaveform(key).into());
                }
            }
            partition_links.insert(partition.id(), attached);
        }

        let ctx = WindowContext {
            window,
            grids: &grids,
            links: &partition_links,
            initial_states,
            cache,
        };
        let ids = registry.ids();
        let mut state = RelaxationIterationState::new(seeds);
        let mut latest: BTreeMap<PartitionId, Arc<CachedSolve>> = BTreeMap::new();
        let (mut hits, mut misses) = (0, 0);

        while state.iteration < self.config.max_iterations {
            let iteration = state.iteration + 1;
            let solves = if self.config.parallel && self.partitioner.is_parallel_safe() {
                let snapshot = &state.snapshot;
                registry
                    .partitions_mut()
                    .par_iter_mut()
                    .map(|partition| self.solve_partition(partition, &ctx, snapshot, None, iteration))
                    .collect::<RelaxResult<Vec<_>>>()?
            } else {
                let mut produced = BoundaryWaveforms::new();
                let mut solves = Vec::with_capacity(ids.len());
                for task in self.partitioner.order(graph, &ids, iteration) {
                    let fresh = match task.snapshot {
                        Snapshot::Previous => None,
                        Snapshot::Freshest => Some(&produced),
                    };
                    let partition = registry.get_mut(task.partition)?;
                    let solved = self.solve_partition(partition, &ctx, &state.snapshot, fresh, iteration)?;
                    produced.extend(solved.solve.outgoing.iter().map(|(k, w)| (*k, w.clone())));
                    solves.push(solved);
                }
                solves
            };

            let mut fresh = BoundaryWaveforms::new();
            for solved in solves {
                if solved.cached {
                    hits += 1;
                } else {
                    misses += 1;
                }
                fresh.extend(solved.solve.outgoing.iter().map(|(k, w)| (*k, w.clone())));
                latest.insert(solved.partition, solved.solve);
            }

            let residual = self.config.norm.combine(fresh.iter().map(|(key, waveform)| {
                state
                    .snapshot
                    .get(key)
                    .map_or(f64::INFINITY, |previous| waveform.max_abs_difference(previous))
            }));
            state.iteration = iteration;
            state.residuals.push(residual);
            state.snapshot.extend(fresh);
            tracing::debug!(window = window.index, iteration, residual, "relaxation iteration");

            if residual <= self.config.tolerance {
                state.converged = true;
                break;
            }
        }

        if !state.converged {
            tracing::warn!(
                window = window.index,
                iterations = state.iteration,
                residual = state.residual().unwrap_or(f64::NAN),
                "window did not converge"
            );
        }

        Ok(WindowOutcome {
            window: *window,
            traces: latest.into_iter().map(|(id, solve)| (id, solve.trace.clone())).collect(),
            waveforms: state.snapshot,
            iterations: state.iteration,
            residual_history: state.residuals,
            converged: state.converged,
            cache_hits: hits,
            cache_misses: misses,
        })
    }

    fn solve_partition(
        &self,
        partition: &mut Partition,
        ctx: &WindowContext<'_>,
        snapshot: &BoundaryWaveforms,
        fresh: Option<&BoundaryWaveforms>,
        iteration: usize,
    ) -> RelaxResult<PartitionSolve> {
        let id = partition.id();
        let failed = |source: FemError| RelaxError::Partition {
            partition: id,
            window: ctx.window.index,
            iteration,
            source,
        };
        let grid = ctx.grids.get(&id).ok_or(RelaxError::PartitionNotFound(id))?;
        let start = ctx.initial_states.get(&id).ok_or(RelaxError::PartitionNotFound(id))?;
        let attached = ctx.links.get(&id).map(Vec::as_slice).unwrap_or_default();

        let mut incoming = BoundaryWaveforms::new();
        for link in attached {
            let key = link.incoming();
            let waveform = fresh
                .and_then(|f| f.get(&key))
                .or_else(|| snapshot.get(&key))
                .ok_or_else(|| failed(FemError::MissingWaveform(key)))?;
            incoming.insert(key, self.exchange.incoming(waveform, grid)?);
        }

        let key = CacheKey {
            partition: id,
            window: ctx.window.index,
            fingerprint: Fingerprint::of(start, grid, &incoming),
        };
        if let Some(solve) = ctx.cache.get(&key) {
            return Ok(PartitionSolve {
                partition: id,
                solve,
                cached: true,
            });
        }

        partition.model.reset(ctx.window.start, start.clone()).map_err(failed)?;
        let trace = partition
            .model
            .step(self.integrator.as_ref(), grid, &incoming)
            .map_err(failed)?;
        let outgoing = outgoing_waveforms(id, attached, &trace, &incoming).map_err(failed)?;
        Ok(PartitionSolve {
            partition: id,
            solve: ctx.cache.put(key, CachedSolve { trace, outgoing }),
            cached: false,
        })
    }
}

/// Robin data sent over each link: `2 p u - lambda_in` at every step of the
/// sender's trace.
fn outgoing_waveforms(
    owner: PartitionId,
    attached: &[CouplingLink],
    trace: &StateTrace,
    incoming: &BoundaryWaveforms,
) -> FemResult<BTreeMap<WaveformKey, Waveform>> {
    let mut out = BTreeMap::new();
    for link in attached {
        let key = link.incoming();
        let received = incoming.get(&key).ok_or(FemError::MissingWaveform(key))?;
        let values = trace
            .times
            .iter()
            .zip(&trace.states)
            .map(|(&t, state)| {
                let lambda = received.sample(t);
                DVector::from_iterator(
                    link.local_dofs.len(),
                    link.local_dofs
                        .iter()
                        .enumerate()
                        .map(|(i, &dof)| 2.0 * link.penalty * state.u[dof] - lambda[i]),
                )
            })
            .collect();
        out.insert(link.outgoing(owner), Waveform::new(trace.times.clone(), values)?);
    }
    Ok(out)
}
