//! Scenario validation logic.

use std::collections::{BTreeMap, HashSet};

use wr_core::InterfaceDof;
use wr_fem::Newmark;

use crate::schema::{
    BoundaryDef, ExchangeDef, HorizonDef, IntegratorDef, ModelDef, PartitionDef, SCHEMA_VERSION, Scenario, StrategyDef,
};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > SCHEMA_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    validate_horizon(&scenario.horizon)?;
    positive("penalty", scenario.penalty)?;

    let IntegratorDef { beta, gamma } = scenario.integrator;
    Newmark::new(beta, gamma).map_err(|e| invalid("integrator", format!("beta={beta}, gamma={gamma}"), &e.to_string()))?;

    scenario
        .relaxation
        .validate()
        .map_err(|e| invalid("relaxation", e, "rejected by the relaxation engine"))?;

    if let (StrategyDef::GaussSeidel { .. }, ExchangeDef::Heterogeneous) = (scenario.strategy, scenario.exchange) {
        return Err(ValidationError::Unsupported {
            feature: "gauss-seidel with heterogeneous exchange".to_string(),
            reason: "partitions on different grids are only relaxed with jacobi".to_string(),
        });
    }

    if scenario.partitions.is_empty() {
        return Err(invalid("partitions", 0, "at least one partition is required"));
    }

    let mut names = HashSet::new();
    for partition in &scenario.partitions {
        if !names.insert(&partition.name) {
            return Err(ValidationError::DuplicateId {
                id: partition.name.clone(),
                context: "partitions".to_string(),
            });
        }
        validate_partition(partition)?;
    }

    if scenario.exchange == ExchangeDef::Homogeneous {
        let default = scenario.horizon.steps_per_window;
        if let Some(p) = scenario
            .partitions
            .iter()
            .find(|p| p.steps_per_window.is_some_and(|s| s != default))
        {
            return Err(invalid(
                format!("partition '{}' steps_per_window", p.name),
                p.steps_per_window.unwrap_or(default),
                "homogeneous exchange needs every partition on the horizon grid",
            ));
        }
    }

    // every interface dof must be shared by at least two partitions
    let mut owners: BTreeMap<InterfaceDof, Vec<&str>> = BTreeMap::new();
    for partition in &scenario.partitions {
        for iface in &partition.interface {
            owners.entry(iface.dof).or_default().push(&partition.name);
        }
    }
    if let Some((dof, names)) = owners.iter().find(|(_, names)| names.len() < 2) {
        return Err(ValidationError::MissingReference {
            id: format!("interface dof {}", dof.0),
            context: format!("partition '{}' shares it with no other partition", names[0]),
        });
    }

    Ok(())
}

fn validate_horizon(horizon: &HorizonDef) -> Result<(), ValidationError> {
    if !(horizon.start.is_finite() && horizon.end.is_finite() && horizon.start < horizon.end) {
        return Err(invalid(
            "horizon",
            format!("[{}, {}]", horizon.start, horizon.end),
            "start must be finite and before end",
        ));
    }
    match (horizon.windows, horizon.window_length) {
        (Some(0), None) => return Err(invalid("horizon windows", 0, "must be positive")),
        (Some(_), None) => {}
        (None, Some(length)) => positive("horizon window_length", length)?,
        _ => {
            return Err(invalid(
                "horizon",
                "windows/window_length",
                "give exactly one of windows and window_length",
            ));
        }
    }
    if horizon.steps_per_window == 0 {
        return Err(invalid("horizon steps_per_window", 0, "must be positive"));
    }
    Ok(())
}

fn validate_partition(partition: &PartitionDef) -> Result<(), ValidationError> {
    let name = &partition.name;
    match &partition.model {
        ModelDef::Heat {
            start,
            end,
            elements,
            material,
            initial_temperature,
            quadrature_points,
            ..
        } => {
            if !(start.is_finite() && end.is_finite() && start < end) {
                return Err(invalid(
                    format!("partition '{name}' domain"),
                    format!("[{start}, {end}]"),
                    "start must be finite and before end",
                ));
            }
            if *elements == 0 {
                return Err(invalid(format!("partition '{name}' elements"), 0, "must be positive"));
            }
            positive(format!("partition '{name}' density"), material.density)?;
            positive(format!("partition '{name}' specific_heat"), material.specific_heat)?;
            positive(format!("partition '{name}' conductivity"), material.conductivity)?;
            if !material.conductivity_slope.is_finite() {
                return Err(invalid(
                    format!("partition '{name}' conductivity_slope"),
                    material.conductivity_slope,
                    "must be finite",
                ));
            }
            if !initial_temperature.is_finite() {
                return Err(invalid(
                    format!("partition '{name}' initial_temperature"),
                    initial_temperature,
                    "must be finite",
                ));
            }
            if let Some(points) = quadrature_points
                && !(1..=3).contains(points)
            {
                return Err(invalid(format!("partition '{name}' quadrature_points"), points, "must be 1, 2 or 3"));
            }
        }
        ModelDef::SpringChain {
            masses,
            springs,
            initial_displacement,
        } => {
            if masses.is_empty() || masses.len() != springs.len() {
                return Err(invalid(
                    format!("partition '{name}' springs"),
                    springs.len(),
                    "need one spring per mass",
                ));
            }
            for &m in masses {
                positive(format!("partition '{name}' mass"), m)?;
            }
            for &k in springs {
                positive(format!("partition '{name}' spring"), k)?;
            }
            if !initial_displacement.is_empty() && initial_displacement.len() != masses.len() {
                return Err(invalid(
                    format!("partition '{name}' initial_displacement"),
                    initial_displacement.len(),
                    "need one value per mass",
                ));
            }
        }
    }

    if partition.steps_per_window == Some(0) {
        return Err(invalid(format!("partition '{name}' steps_per_window"), 0, "must be positive"));
    }

    let dofs = partition.model.dof_count();
    for boundary in &partition.boundaries {
        if let Some(&dof) = boundary.dofs().iter().find(|&&d| d >= dofs) {
            return Err(invalid(
                format!("partition '{name}' boundary dof"),
                dof,
                "outside the model",
            ));
        }
        let value = match boundary {
            BoundaryDef::Dirichlet { value, .. } => *value,
            BoundaryDef::Neumann { flux, .. } => *flux,
        };
        if !value.is_finite() {
            return Err(invalid(format!("partition '{name}' boundary value"), value, "must be finite"));
        }
    }

    let mut shared = HashSet::new();
    let mut local = HashSet::new();
    for iface in &partition.interface {
        if !shared.insert(iface.dof) {
            return Err(ValidationError::DuplicateId {
                id: iface.dof.0.to_string(),
                context: format!("partition '{name}' interface"),
            });
        }
        if iface.local >= dofs {
            return Err(invalid(format!("partition '{name}' interface local"), iface.local, "outside the model"));
        }
        if !local.insert(iface.local) {
            return Err(ValidationError::DuplicateId {
                id: iface.local.to_string(),
                context: format!("partition '{name}' interface local dofs"),
            });
        }
        if partition
            .boundaries
            .iter()
            .any(|b| matches!(b, BoundaryDef::Dirichlet { .. }) && b.dofs().contains(&iface.local))
        {
            return Err(invalid(
                format!("partition '{name}' interface local"),
                iface.local,
                "interface dofs cannot also be fixed",
            ));
        }
    }
    Ok(())
}
