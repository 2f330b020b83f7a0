//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wr_core::PartitionId;
use wr_relax::{RunReport, WindowSummary};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub solver_version: String,
    pub strategy: String,
    pub exchange: String,
    pub partitions: Vec<String>,
    pub converged: bool,
    pub cache_hits: usize,
    pub cache_misses: usize,
    #[serde(default)]
    pub windows: Vec<WindowSummary>,
}

impl RunManifest {
    /// Manifest for `report`, stamped with the current time.
    pub fn from_report(
        run_id: RunId,
        scenario: &str,
        solver_version: &str,
        strategy: &str,
        exchange: &str,
        partitions: Vec<String>,
        report: &RunReport,
    ) -> Self {
        Self {
            run_id,
            scenario: scenario.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            solver_version: solver_version.to_string(),
            strategy: strategy.to_string(),
            exchange: exchange.to_string(),
            partitions,
            converged: report.all_converged(),
            cache_hits: report.cache_hits,
            cache_misses: report.cache_misses,
            windows: report.windows.clone(),
        }
    }

    pub fn total_iterations(&self) -> usize {
        self.windows.iter().map(|w| w.iterations).sum()
    }
}

/// One partition's state at one time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeseriesRecord {
    pub partition: String,
    pub window: usize,
    pub time: f64,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub a: Vec<f64>,
}

/// Flatten a run into records, window by window and partition by partition.
/// A window's start sample repeats the previous window's end and is written
/// only for the first window.
pub fn timeseries_records(report: &RunReport, names: &BTreeMap<PartitionId, String>) -> Vec<TimeseriesRecord> {
    let mut records = Vec::new();
    for window in report.solution.windows() {
        let skip = usize::from(window.window.index > 0);
        for (id, trace) in &window.traces {
            let partition = names.get(id).cloned().unwrap_or_else(|| id.to_string());
            for (&time, state) in trace.times.iter().zip(&trace.states).skip(skip) {
                records.push(TimeseriesRecord {
                    partition: partition.clone(),
                    window: window.window.index,
                    time,
                    u: state.u.iter().copied().collect(),
                    v: state.v.iter().copied().collect(),
                    a: state.a.iter().copied().collect(),
                });
            }
        }
    }
    records
}

/// Values of one dof of one partition over time.
pub fn dof_series(records: &[TimeseriesRecord], partition: &str, dof: usize) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter(|r| r.partition == partition)
        .filter_map(|r| r.u.get(dof).map(|&u| (r.time, u)))
        .collect()
}
