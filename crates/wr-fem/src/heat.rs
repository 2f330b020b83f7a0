//! One-dimensional heat conduction, optionally with temperature-dependent
//! conductivity.

use std::cell::Cell;

use nalgebra::{DMatrix, DVector};

use crate::assembly::{AssembledSystem, AssemblyMap};
use crate::boundary::{BoundaryCondition, BoundaryWaveforms};
use crate::element::{GaussLegendre, LinearLagrange, QuadratureRule, ShapeFunctions};
use crate::error::{FemError, FemResult};
use crate::integrator::{TimeIntegrator, equilibrium_residual};
use crate::mesh::Mesh1d;
use crate::model::{ModelCore, ModelPhase, SingleStep, TransientModel, march};
use crate::newton::{NewtonConfig, finite_difference_jacobian, newton_solve};
use crate::state::{State, StateTrace};

/// Material constants. Conductivity varies as `k (1 + slope * u)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatMaterial {
    pub density: f64,
    pub specific_heat: f64,
    pub conductivity: f64,
    pub conductivity_slope: f64,
}

impl Default for HeatMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            specific_heat: 1.0,
            conductivity: 1.0,
            conductivity_slope: 0.0,
        }
    }
}

impl HeatMaterial {
    pub fn conductivity_at(&self, temperature: f64) -> f64 {
        self.conductivity * (1.0 + self.conductivity_slope * temperature)
    }

    pub fn validate(&self) -> FemResult<()> {
        let positive = [self.density, self.specific_heat, self.conductivity];
        if positive.iter().any(|x| !(x.is_finite() && *x > 0.0)) {
            return Err(FemError::invalid(
                "density, specific heat and conductivity must be positive",
            ));
        }
        if !self.conductivity_slope.is_finite() {
            return Err(FemError::invalid("conductivity slope must be finite"));
        }
        Ok(())
    }
}

/// Heat equation `rho c u_t = (k(u) u_x)_x` on a line mesh with linear
/// elements. Nonlinear conductivity is handled by Newton iteration per step.
#[derive(Clone, Debug)]
pub struct HeatConductionModel {
    mesh: Mesh1d,
    map: AssemblyMap,
    material: HeatMaterial,
    shape: LinearLagrange,
    quadrature: GaussLegendre,
    initial: DVector<f64>,
    newton: NewtonConfig,
    core: ModelCore,
}

impl HeatConductionModel {
    pub fn new(mesh: Mesh1d, material: HeatMaterial) -> FemResult<Self> {
        material.validate()?;
        let map = mesh.assembly_map()?;
        let shape = LinearLagrange;
        map.check(mesh.element_count(), shape.node_count())?;
        let n = mesh.node_count();
        Ok(Self {
            mesh,
            map,
            material,
            shape,
            quadrature: GaussLegendre::default(),
            initial: DVector::zeros(n),
            newton: NewtonConfig::default(),
            core: ModelCore::new(State::zeros(n)),
        })
    }

    pub fn with_initial_temperature(mut self, temperature: f64) -> Self {
        self.initial.fill(temperature);
        self.core.state.u.fill(temperature);
        self
    }

    pub fn with_initial_field(mut self, field: DVector<f64>) -> FemResult<Self> {
        if field.len() != self.mesh.node_count() {
            return Err(FemError::invalid(format!(
                "initial field has {} values for {} nodes",
                field.len(),
                self.mesh.node_count()
            )));
        }
        self.core.state.u.copy_from(&field);
        self.initial = field;
        Ok(self)
    }

    pub fn with_boundary(mut self, condition: BoundaryCondition) -> FemResult<Self> {
        let n = self.dof_count();
        self.core.add_condition(condition, n)?;
        Ok(self)
    }

    pub fn with_quadrature(mut self, quadrature: GaussLegendre) -> Self {
        self.quadrature = quadrature;
        self
    }

    pub fn with_newton(mut self, newton: NewtonConfig) -> Self {
        self.newton = newton;
        self
    }

    /// Retry a diverging step once as two half steps.
    pub fn with_step_halving(mut self, enabled: bool) -> Self {
        self.core.step_halving = enabled;
        self
    }

    pub fn mesh(&self) -> &Mesh1d {
        &self.mesh
    }

    pub fn material(&self) -> &HeatMaterial {
        &self.material
    }

    /// Capacity and conductivity matrices around temperature `u`, plus
    /// boundary contributions.
    fn system_at(&self, time: f64, u: &DVector<f64>, waveforms: &BoundaryWaveforms) -> FemResult<AssembledSystem> {
        let n = self.dof_count();
        if u.len() != n {
            return Err(FemError::assembly(format!(
                "temperature has {} values for {n} dofs",
                u.len()
            )));
        }
        let mut system = AssembledSystem::zeros(time, n, false);
        let rho_c = self.material.density * self.material.specific_heat;
        let nodes = self.shape.node_count();

        for e in 0..self.mesh.element_count() {
            let dofs = self
                .map
                .element_dofs(e)
                .ok_or_else(|| FemError::assembly(format!("element {e} missing from dof map")))?;
            let jacobian = 0.5 * self.mesh.element_length(e);
            let mut capacity = DMatrix::zeros(nodes, nodes);
            let mut conduction = DMatrix::zeros(nodes, nodes);

            for (xi, weight) in self.quadrature.points() {
                let n_values = self.shape.values(xi);
                let dn = self.shape.derivatives(xi);
                let u_q: f64 = n_values.iter().zip(dofs).map(|(n, &d)| n * u[d]).sum();
                let k = self.material.conductivity_at(u_q);
                if !k.is_finite() {
                    return Err(FemError::NonFinite {
                        what: format!("conductivity in element {e} at t={time}"),
                    });
                }
                for a in 0..nodes {
                    for b in 0..nodes {
                        capacity[(a, b)] += weight * rho_c * n_values[a] * n_values[b] * jacobian;
                        conduction[(a, b)] += weight * k * dn[a] * dn[b] / jacobian;
                    }
                }
            }
            self.map.scatter_matrix(e, &capacity, &mut system.damping)?;
            self.map.scatter_matrix(e, &conduction, &mut system.stiffness)?;
        }

        for condition in &self.core.conditions {
            condition.apply(&mut system, waveforms)?;
        }
        Ok(system)
    }
}

impl SingleStep for HeatConductionModel {
    fn single_step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        state: &State,
        from: f64,
        to: f64,
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<State> {
        let dt = to - from;
        self.core.assemblies += 1;
        let frozen = self.system_at(to, &state.u, waveforms)?;
        let guess = integrator.advance(state, dt, &frozen)?;
        if !self.is_nonlinear() {
            return Ok(guess);
        }

        let weights = integrator.weights(dt, false)?;
        let predicted = integrator.predict(state, dt, false);
        let evaluations = Cell::new(0_usize);
        let residual = |x: &DVector<f64>| -> FemResult<DVector<f64>> {
            evaluations.set(evaluations.get() + 1);
            let trial = integrator.correct(&predicted, x, weights);
            let system = self.system_at(to, &trial.u, waveforms)?;
            Ok(equilibrium_residual(&system, &trial, weights))
        };
        let jacobian = |x: &DVector<f64>| finite_difference_jacobian(x, residual, self.newton.fd_epsilon);
        let result = newton_solve(integrator.unknown(&guess, false), residual, jacobian, &self.newton);
        self.core.assemblies += evaluations.get();
        let result = result?;

        if !result.converged {
            return Err(FemError::Divergence {
                time: to,
                what: result.failure.unwrap_or_else(|| "Newton iteration did not converge".to_string()),
            });
        }
        tracing::trace!(time = to, iterations = result.iterations, "Newton step converged");
        Ok(integrator.correct(&predicted, &result.x, weights))
    }
}

impl TransientModel for HeatConductionModel {
    fn dof_count(&self) -> usize {
        self.mesh.node_count()
    }

    fn is_nonlinear(&self) -> bool {
        self.material.conductivity_slope != 0.0
    }

    fn phase(&self) -> ModelPhase {
        self.core.phase
    }

    fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.core.conditions
    }

    fn boundary_conditions_mut(&mut self) -> &mut Vec<BoundaryCondition> {
        &mut self.core.conditions
    }

    fn initial_state(&self, time: f64) -> FemResult<State> {
        let mut state = State::at_rest(self.initial.clone());
        self.core.apply_dirichlet(time, &mut state)?;
        Ok(state)
    }

    fn time(&self) -> f64 {
        self.core.time
    }

    fn state(&self) -> &State {
        &self.core.state
    }

    fn history(&self) -> &[State] {
        &self.core.history
    }

    fn reset(&mut self, time: f64, state: State) -> FemResult<()> {
        self.core.reset(time, state)
    }

    fn assemble(&mut self, time: f64, waveforms: &BoundaryWaveforms) -> FemResult<AssembledSystem> {
        self.core.assemblies += 1;
        let system = self.system_at(time, &self.core.state.u, waveforms)?;
        self.core.phase = ModelPhase::Assembled;
        Ok(system)
    }

    fn step(
        &mut self,
        integrator: &dyn TimeIntegrator,
        grid: &[f64],
        waveforms: &BoundaryWaveforms,
    ) -> FemResult<StateTrace> {
        let start = self.core.state.clone();
        let (time, halving) = (self.core.time, self.core.step_halving);
        let trace = march(self, integrator, time, &start, grid, waveforms, halving)?;
        self.core.accept(&trace);
        Ok(trace)
    }

    fn assembly_count(&self) -> usize {
        self.core.assemblies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::Newmark;
    use crate::waveform::WaveformKey;
    use wr_core::{Id, uniform_grid};

    fn bar(material: HeatMaterial) -> HeatConductionModel {
        let mesh = Mesh1d::uniform(0.0, 1.0, 10).unwrap();
        HeatConductionModel::new(mesh, material)
            .unwrap()
            .with_initial_temperature(50.0)
            .with_boundary(BoundaryCondition::dirichlet(vec![0], 0.0))
            .unwrap()
            .with_boundary(BoundaryCondition::dirichlet(vec![10], 100.0))
            .unwrap()
    }

    /// Backward Euler (`gamma = 1`) damps the start-up transient for steady-state checks.
    fn run_to(model: &mut HeatConductionModel, end: f64, steps: usize) -> StateTrace {
        let newmark = Newmark::new(1.0, 1.0).unwrap();
        let none = BoundaryWaveforms::new();
        let start = model.initial_state(0.0).unwrap();
        model.reset(0.0, start).unwrap();
        let system = model.assemble(0.0, &none).unwrap();
        let start = newmark.initial_rates(model.state(), &system).unwrap();
        model.reset(0.0, start).unwrap();
        model.step(&newmark, &uniform_grid(0.0, end, steps).unwrap(), &none).unwrap()
    }

    #[test]
    fn matrices_have_expected_structure() {
        let mut model = bar(HeatMaterial::default());
        let system = model.assemble(0.0, &BoundaryWaveforms::new()).unwrap();
        assert!(system.mass.is_none());
        assert!((system.damping.sum() - 1.0).abs() < 1e-12);

        // a linear field carries no net flux into interior nodes
        let linear = DVector::from_iterator(11, model.mesh().nodes().iter().copied());
        let flux = &system.stiffness * linear;
        assert!(flux.rows(1, 9).amax() < 1e-12);
        assert_eq!(system.constraints, vec![(0, 0.0), (10, 100.0)]);
        assert_eq!(model.phase(), ModelPhase::Assembled);
    }

    #[test]
    fn initial_state_applies_dirichlet_values() {
        let state = bar(HeatMaterial::default()).initial_state(0.0).unwrap();
        assert_eq!(state.u[0], 0.0);
        assert_eq!(state.u[5], 50.0);
        assert_eq!(state.u[10], 100.0);
    }

    #[test]
    fn linear_bar_reaches_linear_profile() {
        let mut model = bar(HeatMaterial::default());
        let trace = run_to(&mut model, 5.0, 100);
        assert_eq!(trace.len(), 101);
        assert_eq!(model.history().len(), 100);
        assert_eq!(model.phase(), ModelPhase::Stepped);

        let last = trace.last().unwrap();
        for (i, x) in model.mesh().nodes().iter().enumerate() {
            assert!((last.u[i] - 100.0 * x).abs() < 1e-6, "node {i}: {}", last.u[i]);
        }
    }

    #[test]
    fn nonlinear_bar_matches_kirchhoff_profile() {
        let material = HeatMaterial {
            conductivity_slope: 0.01,
            ..HeatMaterial::default()
        };
        let mut model = bar(material);
        assert!(model.is_nonlinear());
        let trace = run_to(&mut model, 5.0, 100);

        // (u + a u^2 / 2) is linear in x at steady state
        let a = 0.01;
        let phi_end = 100.0 + 0.5 * a * 100.0 * 100.0;
        let expected = |x: f64| ((1.0 + 2.0 * a * phi_end * x).sqrt() - 1.0) / a;
        let mid = trace.last().unwrap().u[5];
        assert!((mid - expected(0.5)).abs() < 0.5, "midpoint {mid}");
        assert!(mid > 55.0);
    }

    #[test]
    fn restepping_after_reset_is_idempotent() {
        let mut model = bar(HeatMaterial::default());
        let newmark = Newmark::default();
        let none = BoundaryWaveforms::new();
        let grid = uniform_grid(0.0, 0.25, 5).unwrap();
        let start = model.initial_state(0.0).unwrap();

        model.reset(0.0, start.clone()).unwrap();
        assert_eq!(model.phase(), ModelPhase::Uninitialized);
        let first = model.step(&newmark, &grid, &none).unwrap();
        let assemblies = model.assembly_count();

        model.reset(0.0, start).unwrap();
        let second = model.step(&newmark, &grid, &none).unwrap();
        assert_eq!(first, second);
        assert_eq!(model.assembly_count(), 2 * assemblies);
    }

    #[test]
    fn step_rejects_grid_not_starting_at_current_time() {
        let mut model = bar(HeatMaterial::default());
        let err = model
            .step(&Newmark::default(), &[0.5, 1.0], &BoundaryWaveforms::new())
            .unwrap_err();
        assert!(matches!(err, FemError::InvalidParameters { .. }));
    }

    #[test]
    fn coupling_needs_its_waveform() {
        let key = WaveformKey::new(Id::from_index(0), Id::from_index(1));
        let mut model = bar(HeatMaterial::default())
            .with_boundary(BoundaryCondition::coupling(vec![10], 4.0, key))
            .unwrap();
        let err = model
            .step(&Newmark::default(), &[0.0, 0.1], &BoundaryWaveforms::new())
            .unwrap_err();
        assert_eq!(err, FemError::MissingWaveform(key));
    }

    #[test]
    fn rejects_bad_material_and_fields() {
        let mesh = Mesh1d::uniform(0.0, 1.0, 4).unwrap();
        let bad = HeatMaterial {
            conductivity: 0.0,
            ..HeatMaterial::default()
        };
        assert!(HeatConductionModel::new(mesh.clone(), bad).is_err());
        let model = HeatConductionModel::new(mesh, HeatMaterial::default()).unwrap();
        assert!(model.with_initial_field(DVector::zeros(3)).is_err());
    }
}
