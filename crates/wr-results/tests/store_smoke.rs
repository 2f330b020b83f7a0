use wr_results::*;

fn manifest(run_id: &str, scenario: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        scenario: scenario.to_string(),
        timestamp: timestamp.to_string(),
        solver_version: "v1".to_string(),
        strategy: "jacobi".to_string(),
        exchange: "homogeneous".to_string(),
        partitions: vec!["left".to_string(), "right".to_string()],
        converged: true,
        cache_hits: 0,
        cache_misses: 4,
        windows: vec![],
    }
}

fn record(time: f64, u: f64) -> TimeseriesRecord {
    TimeseriesRecord {
        partition: "left".to_string(),
        window: 0,
        time,
        u: vec![u],
        v: vec![0.0],
        a: vec![0.0],
    }
}

#[test]
fn save_and_load_run() {
    let temp_dir = std::env::temp_dir().join("wr_results_test");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = RunStore::new(temp_dir).unwrap();

    let manifest = manifest("test_run_123", "two-bar", "2026-02-25T12:00:00+00:00");
    store
        .save_run(&manifest, &[record(0.0, 50.0), record(1.0, 49.0)])
        .unwrap();

    assert!(store.has_run("test_run_123"));
    assert_eq!(store.load_manifest("test_run_123").unwrap(), manifest);
    let loaded = store.load_timeseries("test_run_123").unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(dof_series(&loaded, "left", 0), vec![(0.0, 50.0), (1.0, 49.0)]);

    store.delete_run("test_run_123").unwrap();
    assert!(!store.has_run("test_run_123"));
    assert!(matches!(
        store.load_manifest("test_run_123"),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn list_runs_by_scenario() {
    let temp_dir = std::env::temp_dir().join("wr_results_test_list");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = RunStore::new(temp_dir).unwrap();

    store
        .save_run(&manifest("run2", "a", "2026-02-25T13:00:00+00:00"), &[])
        .unwrap();
    store
        .save_run(&manifest("run1", "a", "2026-02-25T12:00:00+00:00"), &[])
        .unwrap();
    store
        .save_run(&manifest("run3", "b", "2026-02-25T14:00:00+00:00"), &[])
        .unwrap();

    let a_runs = store.list_runs("a").unwrap();
    assert_eq!(a_runs.len(), 2);
    assert_eq!(a_runs[0].run_id, "run1");
    assert_eq!(store.list_runs("b").unwrap().len(), 1);
    assert!(store.list_runs("c").unwrap().is_empty());
}
