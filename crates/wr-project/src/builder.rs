//! Turn a validated scenario into a runnable orchestrator.

use std::collections::BTreeMap;

use nalgebra::DVector;
use wr_core::{Id, InterfaceDof, PartitionId};
use wr_fem::{
    BoundaryCondition, GaussLegendre, HeatConductionModel, HeatMaterial, MatrixModel, Mesh1d, Newmark, State,
    TransientModel,
};
use wr_relax::{
    GaussSeidel, Heterogeneous, Homogeneous, Jacobi, Orchestrator, Partition, PartitionRegistry, Partitioner,
    WaveformExchange, WaveformRelaxation, WindowSequence,
};

use crate::ProjectResult;
use crate::schema::{BoundaryDef, ExchangeDef, HorizonDef, ModelDef, PartitionDef, Scenario, StrategyDef};
use crate::validate::validate_scenario;

/// Command-line style overrides applied on top of a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub strategy: Option<StrategyDef>,
    pub exchange: Option<ExchangeDef>,
    pub parallel: Option<bool>,
}

impl Overrides {
    pub fn apply(&self, scenario: &Scenario) -> Scenario {
        let mut out = scenario.clone();
        if let Some(strategy) = self.strategy {
            out.strategy = strategy;
        }
        if let Some(exchange) = self.exchange {
            out.exchange = exchange;
        }
        if let Some(parallel) = self.parallel {
            out.relaxation.parallel = parallel;
        }
        out
    }
}

/// Partition ids follow declaration order.
pub fn partition_id(index: usize) -> PartitionId {
    Id::from_index(index as u32)
}

pub fn partition_names(scenario: &Scenario) -> BTreeMap<PartitionId, String> {
    scenario
        .partitions
        .iter()
        .enumerate()
        .map(|(i, p)| (partition_id(i), p.name.clone()))
        .collect()
}

pub fn build_model(partition: &PartitionDef) -> ProjectResult<Box<dyn TransientModel>> {
    let conditions = partition.boundaries.iter().map(|b| match b {
        BoundaryDef::Dirichlet { dofs, value } => BoundaryCondition::dirichlet(dofs.clone(), *value),
        BoundaryDef::Neumann { dofs, flux } => BoundaryCondition::neumann(dofs.clone(), *flux),
    });

    match &partition.model {
        ModelDef::Heat {
            start,
            end,
            elements,
            material,
            initial_temperature,
            quadrature_points,
            step_halving,
        } => {
            let material = HeatMaterial {
                density: material.density,
                specific_heat: material.specific_heat,
                conductivity: material.conductivity,
                conductivity_slope: material.conductivity_slope,
            };
            let mut model = HeatConductionModel::new(Mesh1d::uniform(*start, *end, *elements)?, material)?
                .with_initial_temperature(*initial_temperature)
                .with_step_halving(*step_halving);
            if let Some(points) = quadrature_points {
                model = model.with_quadrature(GaussLegendre::new(*points)?);
            }
            for condition in conditions {
                model = model.with_boundary(condition)?;
            }
            Ok(Box::new(model))
        }
        ModelDef::SpringChain {
            masses,
            springs,
            initial_displacement,
        } => {
            let mut model = MatrixModel::spring_chain(masses, springs)?;
            if !initial_displacement.is_empty() {
                model = model.with_initial_state(State::at_rest(DVector::from_column_slice(initial_displacement)))?;
            }
            for condition in conditions {
                model = model.with_boundary(condition)?;
            }
            Ok(Box::new(model))
        }
    }
}

pub fn build_registry(scenario: &Scenario) -> ProjectResult<PartitionRegistry> {
    let mut registry = PartitionRegistry::new();
    for (i, def) in scenario.partitions.iter().enumerate() {
        let interface: BTreeMap<InterfaceDof, usize> =
            def.interface.iter().map(|iface| (iface.dof, iface.local)).collect();
        let mut partition = Partition::new(partition_id(i), def.name.clone(), build_model(def)?, interface)?;
        if let Some(steps) = def.steps_per_window {
            partition = partition.with_steps_per_window(steps)?;
        }
        registry.register(partition)?;
    }
    Ok(registry)
}

pub fn build_windows(horizon: &HorizonDef) -> ProjectResult<WindowSequence> {
    let windows = match (horizon.windows, horizon.window_length) {
        (Some(count), _) => WindowSequence::with_count(horizon.start, horizon.end, count, horizon.steps_per_window)?,
        (None, Some(length)) => {
            WindowSequence::with_length(horizon.start, horizon.end, length, horizon.steps_per_window)?
        }
        (None, None) => WindowSequence::with_count(horizon.start, horizon.end, 1, horizon.steps_per_window)?,
    };
    Ok(windows)
}

pub fn build_engine(scenario: &Scenario) -> ProjectResult<WaveformRelaxation> {
    let partitioner: Box<dyn Partitioner> = match scenario.strategy {
        StrategyDef::Jacobi => Box::new(Jacobi),
        StrategyDef::GaussSeidel { sweep } => Box::new(GaussSeidel::new(sweep)),
    };
    let exchange: Box<dyn WaveformExchange> = match scenario.exchange {
        ExchangeDef::Homogeneous => Box::new(Homogeneous),
        ExchangeDef::Heterogeneous => Box::new(Heterogeneous),
    };
    let integrator = Newmark::new(scenario.integrator.beta, scenario.integrator.gamma)?;
    Ok(WaveformRelaxation::new(
        partitioner,
        exchange,
        Box::new(integrator),
        scenario.relaxation.clone(),
    )?)
}

/// Validate `scenario` and build everything a run needs.
pub fn build_orchestrator(scenario: &Scenario) -> ProjectResult<Orchestrator> {
    validate_scenario(scenario)?;
    let registry = build_registry(scenario)?;
    let windows = build_windows(&scenario.horizon)?;
    let engine = build_engine(scenario)?;
    Ok(Orchestrator::new(registry, windows, engine, scenario.penalty)?)
}

