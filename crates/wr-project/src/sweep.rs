//! Multirate parameter sweeps.
//!
//! Refines the first partition's time grid by a sequence of step ratios and
//! re-splits the horizon into different window counts, relaxing every
//! combination with heterogeneous Jacobi. The result table shows how
//! iteration counts react to grid mismatch and window length.

use std::time::Instant;

use wr_relax::ConvergencePolicy;

use crate::ProjectResult;
use crate::builder::build_orchestrator;
use crate::schema::{ExchangeDef, Scenario, StrategyDef};
use crate::validate::ValidationError;

/// One point of the sweep grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPoint {
    /// Steps of the first partition per step of the others.
    pub step_ratio: usize,
    pub windows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub point: SweepPoint,
    pub iterations: usize,
    pub converged: bool,
    pub elapsed_s: f64,
}

/// `scenario` rewritten for one sweep point.
///
/// Every partition but the first runs on the horizon grid; the first takes
/// `step_ratio` times as many steps. Unconverged windows are accepted so a
/// sweep always completes.
pub fn sweep_variant(scenario: &Scenario, point: SweepPoint) -> ProjectResult<Scenario> {
    if point.step_ratio == 0 || point.windows == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sweep".to_string(),
            value: format!("ratio={}, windows={}", point.step_ratio, point.windows),
            reason: "ratios and window counts must be positive".to_string(),
        }
        .into());
    }
    let mut out = scenario.clone();
    out.strategy = StrategyDef::Jacobi;
    out.exchange = ExchangeDef::Heterogeneous;
    out.relaxation.policy = ConvergencePolicy::BestEffort;
    out.horizon.windows = Some(point.windows);
    out.horizon.window_length = None;

    let base = out.horizon.steps_per_window;
    for (i, partition) in out.partitions.iter_mut().enumerate() {
        partition.steps_per_window = (i == 0).then_some(base * point.step_ratio);
    }
    Ok(out)
}

/// Relax every (ratio, window count) combination, ratios varying slowest.
pub fn run_sweep(scenario: &Scenario, ratios: &[usize], windows: &[usize]) -> ProjectResult<Vec<SweepRow>> {
    let mut rows = Vec::with_capacity(ratios.len() * windows.len());
    for &step_ratio in ratios {
        for &count in windows {
            let point = SweepPoint {
                step_ratio,
                windows: count,
            };
            let variant = sweep_variant(scenario, point)?;
            let started = Instant::now();
            let report = build_orchestrator(&variant)?.run()?;
            rows.push(SweepRow {
                point,
                iterations: report.total_iterations(),
                converged: report.all_converged(),
                elapsed_s: started.elapsed().as_secs_f64(),
            });
        }
    }
    Ok(rows)
}

pub fn sweep_csv(rows: &[SweepRow]) -> String {
    let mut csv = String::from("step_ratio,windows,iterations,converged,elapsed_s\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            row.point.step_ratio, row.point.windows, row.iterations, row.converged, row.elapsed_s
        ));
    }
    csv
}
