//! Chains of heat-conducting bars that start cold and relax towards the
//! linear steady profile between a 0 end and a 100 end.
//!
//! Bar `i` covers `[i, i + 1]`; neighbours share one interface node. The
//! interfaces begin at 0 and have to travel to `100 * i / count`.

use std::collections::BTreeMap;

use wr_core::{Id, InterfaceDof};
use wr_fem::{BoundaryCondition, HeatConductionModel, HeatMaterial, Mesh1d, Newmark, TransientModel};
use wr_relax::{
    GaussSeidel, Homogeneous, Jacobi, Orchestrator, Partition, PartitionRegistry, Partitioner, RelaxationConfig,
    RunReport, SweepOrder, WaveformRelaxation, WindowSequence,
};

const ELEMENTS: usize = 8;
const PENALTY: f64 = 4.0;

fn cold_bar(start: f64, fixed: Option<(usize, f64)>) -> Box<dyn TransientModel> {
    let mut model =
        HeatConductionModel::new(Mesh1d::uniform(start, start + 1.0, ELEMENTS).unwrap(), HeatMaterial::default())
            .unwrap()
            .with_initial_temperature(0.0);
    if let Some((dof, value)) = fixed {
        model = model
            .with_boundary(BoundaryCondition::dirichlet(vec![dof], value))
            .unwrap();
    }
    Box::new(model)
}

fn chain(count: usize) -> PartitionRegistry {
    let mut registry = PartitionRegistry::new();
    for i in 0..count {
        let fixed = if i == 0 {
            Some((0, 0.0))
        } else if i == count - 1 {
            Some((ELEMENTS, 100.0))
        } else {
            None
        };
        let mut interface = BTreeMap::new();
        if i > 0 {
            interface.insert(InterfaceDof(i as u64), 0);
        }
        if i + 1 < count {
            interface.insert(InterfaceDof(i as u64 + 1), ELEMENTS);
        }
        let partition = Partition::new(Id::from_index(i as u32), format!("bar{i}"), cold_bar(i as f64, fixed), interface)
            .unwrap();
        registry.register(partition).unwrap();
    }
    registry
}

fn relax(count: usize, end: f64, steps: usize, partitioner: Box<dyn Partitioner>) -> RunReport {
    let config = RelaxationConfig {
        tolerance: 1e-8,
        max_iterations: 500,
        ..RelaxationConfig::default()
    };
    let engine = WaveformRelaxation::new(
        partitioner,
        Box::new(Homogeneous),
        Box::new(Newmark::new(1.0, 1.0).unwrap()),
        config,
    )
    .unwrap();
    let windows = WindowSequence::with_count(0.0, end, 4, steps).unwrap();
    Orchestrator::new(chain(count), windows, engine, PENALTY)
        .unwrap()
        .run()
        .unwrap()
}

fn assert_steady_interfaces(report: &RunReport, count: usize) {
    for i in 1..count {
        let expected = 100.0 * i as f64 / count as f64;
        let before = report.solution.partition_trace(Id::from_index(i as u32 - 1)).unwrap();
        let after = report.solution.partition_trace(Id::from_index(i as u32)).unwrap();

        assert_eq!(before.states[0].u[ELEMENTS], 0.0, "interface {i} starts cold");
        let from_left = before.last().unwrap().u[ELEMENTS];
        let from_right = after.last().unwrap().u[0];
        assert!((from_left - expected).abs() < 1e-6, "interface {i}: {from_left} vs {expected}");
        assert!((from_right - expected).abs() < 1e-6, "interface {i}: {from_right} vs {expected}");
    }
}

#[test]
fn two_cold_bars_reach_the_midpoint() {
    let jacobi = relax(2, 20.0, 8, Box::new(Jacobi));
    let gauss_seidel = relax(2, 20.0, 8, Box::new(GaussSeidel::new(SweepOrder::Declared)));

    assert!(jacobi.all_converged());
    assert!(gauss_seidel.all_converged());
    assert_steady_interfaces(&jacobi, 2);
    assert_steady_interfaces(&gauss_seidel, 2);
    assert!(
        gauss_seidel.total_iterations() < jacobi.total_iterations(),
        "gauss-seidel {} vs jacobi {}",
        gauss_seidel.total_iterations(),
        jacobi.total_iterations()
    );
}

#[test]
fn three_bar_chain_reaches_the_linear_profile() {
    let jacobi = relax(3, 40.0, 16, Box::new(Jacobi));
    let topological = relax(3, 40.0, 16, Box::new(GaussSeidel::new(SweepOrder::Topological)));

    assert!(jacobi.all_converged());
    assert!(topological.all_converged());
    assert_steady_interfaces(&jacobi, 3);
    assert_steady_interfaces(&topological, 3);
    assert!(topological.total_iterations() < jacobi.total_iterations());
}
