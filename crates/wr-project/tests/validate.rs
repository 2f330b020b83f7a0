use wr_core::InterfaceDof;
use wr_project::*;

fn base() -> Scenario {
    serde_yaml::from_str(
        r#"
version: 1
name: base
horizon: { start: 0.0, end: 1.0, windows: 2, steps_per_window: 4 }
penalty: 3.0
partitions:
  - name: a
    model: { type: heat, start: 0.0, end: 1.0, elements: 4 }
    boundaries: [{ type: dirichlet, dofs: [0], value: 1.0 }]
    interface: [{ dof: 9, local: 4 }]
  - name: b
    model: { type: spring_chain, masses: [1.0, 2.0], springs: [3.0, 4.0] }
    interface: [{ dof: 9, local: 0 }]
"#,
    )
    .unwrap()
}

#[test]
fn base_is_valid() {
    let scenario = base();
    validate_scenario(&scenario).unwrap();
    assert_eq!(scenario.partitions[0].interface[0].dof, InterfaceDof(9));
}

#[test]
fn duplicate_partition_names() {
    let mut scenario = base();
    scenario.partitions[1].name = "a".to_string();
    assert!(matches!(
        validate_scenario(&scenario),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn unshared_interface_dof() {
    let mut scenario = base();
    scenario.partitions[1].interface[0].dof = InterfaceDof(10);
    assert!(matches!(
        validate_scenario(&scenario),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn interface_outside_the_model() {
    let mut scenario = base();
    scenario.partitions[1].interface[0].local = 2;
    assert!(matches!(
        validate_scenario(&scenario),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn fixed_interface_dof() {
    let mut scenario = base();
    scenario.partitions[0].boundaries = vec![BoundaryDef::Dirichlet {
        dofs: vec![4],
        value: 0.0,
    }];
    assert!(validate_scenario(&scenario).is_err());
}

#[test]
fn horizon_needs_exactly_one_split() {
    let mut scenario = base();
    scenario.horizon.window_length = Some(0.5);
    assert!(validate_scenario(&scenario).is_err());
    scenario.horizon.windows = None;
    validate_scenario(&scenario).unwrap();
    scenario.horizon.window_length = None;
    assert!(validate_scenario(&scenario).is_err());
}

#[test]
fn penalty_and_integrator_bounds() {
    let mut scenario = base();
    scenario.penalty = 0.0;
    assert!(validate_scenario(&scenario).is_err());

    let mut scenario = base();
    scenario.integrator = IntegratorDef { beta: 0.1, gamma: 0.5 };
    assert!(validate_scenario(&scenario).is_err());
}

#[test]
fn heterogeneous_gauss_seidel_is_unsupported() {
    let mut scenario = base();
    scenario.strategy = StrategyDef::GaussSeidel {
        sweep: wr_relax::SweepOrder::Declared,
    };
    scenario.exchange = ExchangeDef::Heterogeneous;
    assert!(matches!(
        validate_scenario(&scenario),
        Err(ValidationError::Unsupported { .. })
    ));
}

#[test]
fn homogeneous_needs_one_grid() {
    let mut scenario = base();
    scenario.partitions[0].steps_per_window = Some(8);
    assert!(validate_scenario(&scenario).is_err());
    scenario.exchange = ExchangeDef::Heterogeneous;
    validate_scenario(&scenario).unwrap();
}

#[test]
fn newer_versions_are_rejected() {
    let mut scenario = base();
    scenario.version = SCHEMA_VERSION + 1;
    assert!(matches!(
        validate_scenario(&scenario),
        Err(ValidationError::UnsupportedVersion { .. })
    ));
}
