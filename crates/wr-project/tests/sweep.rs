use std::path::Path;

use wr_project::*;
use wr_relax::ConvergencePolicy;

fn two_bar() -> Scenario {
    load_scenario(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios/two_bar.yaml")).unwrap()
}

#[test]
fn variants_refine_the_first_partition_only() {
    let scenario = two_bar();
    let variant = sweep_variant(
        &scenario,
        SweepPoint {
            step_ratio: 4,
            windows: 2,
        },
    )
    .unwrap();

    assert_eq!(variant.strategy, StrategyDef::Jacobi);
    assert_eq!(variant.exchange, ExchangeDef::Heterogeneous);
    assert_eq!(variant.relaxation.policy, ConvergencePolicy::BestEffort);
    assert_eq!(variant.horizon.windows, Some(2));
    assert_eq!(variant.partitions[0].steps_per_window, Some(32));
    assert_eq!(variant.partitions[1].steps_per_window, None);
    validate_scenario(&variant).unwrap();

    assert!(
        sweep_variant(
            &scenario,
            SweepPoint {
                step_ratio: 0,
                windows: 2
            }
        )
        .is_err()
    );
}

#[test]
fn sweep_covers_every_combination() {
    let rows = run_sweep(&two_bar(), &[1, 2], &[1, 2]).unwrap();

    let points: Vec<(usize, usize)> = rows.iter().map(|r| (r.point.step_ratio, r.point.windows)).collect();
    assert_eq!(points, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    for row in &rows {
        assert!(row.converged, "{:?}", row.point);
        assert!(row.iterations >= row.point.windows);
    }

    let csv = sweep_csv(&rows);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "step_ratio,windows,iterations,converged,elapsed_s");
    assert!(lines[3].starts_with("2,1,"));
}
