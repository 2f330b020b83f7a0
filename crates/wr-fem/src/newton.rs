//! Damped Newton iteration with finite-difference Jacobians.

use nalgebra::{DMatrix, DVector};

use crate::error::{FemError, FemResult};

/// Newton solver configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Relative perturbation for finite-difference Jacobians
    pub fd_epsilon: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            abs_tol: 1e-10,
            rel_tol: 1e-12,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            fd_epsilon: 1e-7,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    pub x: DVector<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Why the iteration stopped without converging.
    pub failure: Option<String>,
}

/// Newton iteration with backtracking line search.
///
/// A step is accepted only if it reduces the residual norm. Running out of
/// iterations or backtracking below a step of `1e-10` yields a result with
/// `converged == false`; errors from the callbacks are propagated.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> FemResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> FemResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> FemResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
                failure: None,
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = jac.lu().solve(&(-&r)).ok_or_else(|| FemError::Singular {
            what: format!("Newton Jacobian at iteration {iter}"),
        })?;

        let mut alpha = 1.0;
        let mut x_new = &x + &dx * alpha;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + &dx * alpha;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        if !(r_new_norm.is_finite() && r_new_norm < r_norm) || alpha < 1e-10 {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter + 1,
                converged: false,
                failure: Some(format!("line search stagnated at iteration {iter}")),
            });
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    let converged = r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm;
    Ok(NewtonResult {
        x,
        residual_norm: r_norm,
        iterations: config.max_iterations,
        converged,
        failure: (!converged).then(|| {
            format!(
                "maximum iterations {} reached, residual = {r_norm:e}",
                config.max_iterations
            )
        }),
    })
}

/// Forward-difference Jacobian of `f` at `x`.
pub fn finite_difference_jacobian<F>(x: &DVector<f64>, f: F, epsilon: f64) -> FemResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> FemResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] += dx;

        let df = (f(&x_perturbed)? - &f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}
