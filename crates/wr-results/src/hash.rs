//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use wr_project::Scenario;

/// SHA-256 over the scenario as JSON and the solver version, hex encoded.
/// The same scenario solved by the same solver always gets the same id.
pub fn compute_run_id(scenario: &Scenario, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(penalty: f64) -> Scenario {
        serde_json::from_str(&format!(
            r#"{{
                "version": 1,
                "name": "hash",
                "horizon": {{ "start": 0.0, "end": 1.0, "windows": 1, "steps_per_window": 2 }},
                "penalty": {penalty},
                "partitions": []
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn hash_stability() {
        let id = compute_run_id(&scenario(1.0), "v1");
        assert_eq!(id, compute_run_id(&scenario(1.0), "v1"));
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let base = compute_run_id(&scenario(1.0), "v1");
        assert_ne!(base, compute_run_id(&scenario(2.0), "v1"));
        assert_ne!(base, compute_run_id(&scenario(1.0), "v2"));
    }
}
