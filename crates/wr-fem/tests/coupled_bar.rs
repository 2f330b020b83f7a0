//! Drives a heat model through a coupling boundary condition the way a
//! relaxation engine would.

use nalgebra::DVector;
use wr_core::{Id, uniform_grid};
use wr_fem::{
    BoundaryCondition, BoundaryWaveforms, HeatConductionModel, HeatMaterial, Mesh1d, ModelPhase, Newmark,
    TimeIntegrator, TransientModel, Waveform, WaveformKey,
};

fn key() -> WaveformKey {
    WaveformKey::new(Id::from_index(0), Id::from_index(1))
}

fn half_bar(penalty: f64) -> HeatConductionModel {
    HeatConductionModel::new(Mesh1d::uniform(0.0, 1.0, 8).unwrap(), HeatMaterial::default())
        .unwrap()
        .with_initial_temperature(50.0)
        .with_boundary(BoundaryCondition::dirichlet(vec![0], 0.0))
        .unwrap()
        .with_boundary(BoundaryCondition::coupling(vec![8], penalty, key()))
        .unwrap()
}

#[test]
fn robin_data_fixes_the_interface_value() {
    // With incoming data p * g held long enough, the Robin end settles where
    // conduction flux balances p (g - u).
    let penalty = 4.0;
    let g = 80.0;
    let newmark = Newmark::new(1.0, 1.0).unwrap();
    let mut model = half_bar(penalty);
    let grid = uniform_grid(0.0, 6.0, 120).unwrap();
    let waveforms = BoundaryWaveforms::from([(
        key(),
        Waveform::constant(0.0, 6.0, DVector::from_element(1, penalty * g)).unwrap(),
    )]);

    let start = model.initial_state(0.0).unwrap();
    model.reset(0.0, start).unwrap();
    let trace = model.step(&newmark, &grid, &waveforms).unwrap();
    assert_eq!(model.phase(), ModelPhase::Stepped);

    // steady state: k u(1) = p (g - u(1))  =>  u(1) = p g / (k + p)
    let end = trace.last().unwrap().u[8];
    assert!((end - penalty * g / (1.0 + penalty)).abs() < 1e-6, "end value {end}");
}

#[test]
fn waveform_is_sampled_on_the_model_grid() {
    // A ramped waveform produces a different trace than its end value held.
    let newmark = Newmark::default();
    let grid = uniform_grid(0.0, 0.5, 10).unwrap();
    let ramp = Waveform::new(
        vec![0.0, 0.5],
        vec![DVector::from_element(1, 0.0), DVector::from_element(1, 400.0)],
    )
    .unwrap();
    let held = ramp.hold_end_value(0.0, 0.5).unwrap();

    let run = |w: Waveform| {
        let mut model = half_bar(4.0);
        let start = model.initial_state(0.0).unwrap();
        model.reset(0.0, start).unwrap();
        let system = model.assemble(0.0, &BoundaryWaveforms::from([(key(), w.clone())])).unwrap();
        let start = newmark.initial_rates(model.state(), &system).unwrap();
        model.reset(0.0, start).unwrap();
        model
            .step(&newmark, &grid, &BoundaryWaveforms::from([(key(), w)]))
            .unwrap()
    };
    let a = run(ramp);
    let b = run(held);
    assert!(a.last().unwrap().u[8] < b.last().unwrap().u[8]);
}
