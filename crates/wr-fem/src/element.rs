//! Shape functions and quadrature on the reference interval `[-1, 1]`.

use crate::error::{FemError, FemResult};

/// Shape functions of a reference element.
pub trait ShapeFunctions {
    fn node_count(&self) -> usize;

    /// `N_a(xi)` for every node `a`.
    fn values(&self, xi: f64) -> Vec<f64>;

    /// `dN_a/dxi` for every node `a`.
    fn derivatives(&self, xi: f64) -> Vec<f64>;
}

/// Integration points and weights on the reference interval.
pub trait QuadratureRule {
    /// `(xi, weight)` pairs.
    fn points(&self) -> Vec<(f64, f64)>;
}

/// Two-node linear Lagrange element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearLagrange;

impl ShapeFunctions for LinearLagrange {
    fn node_count(&self) -> usize {
        2
    }

    fn values(&self, xi: f64) -> Vec<f64> {
        vec![0.5 * (1.0 - xi), 0.5 * (1.0 + xi)]
    }

    fn derivatives(&self, _xi: f64) -> Vec<f64> {
        vec![-0.5, 0.5]
    }
}

/// Gauss-Legendre rule with 1 to 3 points (exact to degree `2n - 1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussLegendre {
    order: usize,
}

impl GaussLegendre {
    pub fn new(order: usize) -> FemResult<Self> {
        if !(1..=3).contains(&order) {
            return Err(FemError::invalid(format!(
                "Gauss-Legendre order must be 1..=3, got {order}"
            )));
        }
        Ok(Self { order })
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

impl Default for GaussLegendre {
    fn default() -> Self {
        Self { order: 2 }
    }
}

impl QuadratureRule for GaussLegendre {
    fn points(&self) -> Vec<(f64, f64)> {
        match self.order {
            1 => vec![(0.0, 2.0)],
            2 => {
                let x = 1.0 / 3.0_f64.sqrt();
                vec![(-x, 1.0), (x, 1.0)]
            }
            _ => {
                let x = (3.0_f64 / 5.0).sqrt();
                vec![(-x, 5.0 / 9.0), (0.0, 8.0 / 9.0), (x, 5.0 / 9.0)]
            }
        }
    }
}
