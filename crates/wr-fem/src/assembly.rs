//! Degree-of-freedom maps and assembled linear systems.

use nalgebra::{DMatrix, DVector};

use crate::error::{FemError, FemResult};

/// Maps `(element, local node)` pairs to global dof indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssemblyMap {
    dof_count: usize,
    elements: Vec<Vec<usize>>,
}

impl AssemblyMap {
    pub fn new(dof_count: usize) -> Self {
        Self {
            dof_count,
            elements: Vec::new(),
        }
    }

    /// Register an element with its global dofs, returning the element index.
    pub fn push_element(&mut self, dofs: Vec<usize>) -> FemResult<usize> {
        if let Some(&bad) = dofs.iter().find(|&&d| d >= self.dof_count) {
            return Err(FemError::assembly(format!(
                "element {} references dof {bad} but the map has {} dofs",
                self.elements.len(),
                self.dof_count
            )));
        }
        self.elements.push(dofs);
        Ok(self.elements.len() - 1)
    }

    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element_dofs(&self, element: usize) -> Option<&[usize]> {
        self.elements.get(element).map(Vec::as_slice)
    }

    /// Global dof of local node `local` in `element`.
    pub fn global(&self, element: usize, local: usize) -> Option<usize> {
        self.elements.get(element)?.get(local).copied()
    }

    /// Verify the map against a mesh with `elements` elements of
    /// `nodes_per_element` nodes each, and that every dof is reached.
    pub fn check(&self, elements: usize, nodes_per_element: usize) -> FemResult<()> {
        if self.elements.len() != elements {
            return Err(FemError::assembly(format!(
                "dof map has {} elements, mesh has {elements}",
                self.elements.len()
            )));
        }
        if let Some((e, _)) = self
            .elements
            .iter()
            .enumerate()
            .find(|(_, dofs)| dofs.len() != nodes_per_element)
        {
            return Err(FemError::assembly(format!(
                "element {e} does not have {nodes_per_element} dofs"
            )));
        }
        let mut reached = vec![false; self.dof_count];
        for &d in self.elements.iter().flatten() {
            reached[d] = true;
        }
        if let Some(orphan) = reached.iter().position(|r| !r) {
            return Err(FemError::assembly(format!(
                "dof {orphan} is not attached to any element"
            )));
        }
        Ok(())
    }

    /// Add an element matrix into a global matrix.
    pub fn scatter_matrix(
        &self,
        element: usize,
        local: &DMatrix<f64>,
        global: &mut DMatrix<f64>,
    ) -> FemResult<()> {
        let dofs = self
            .element_dofs(element)
            .ok_or_else(|| FemError::assembly(format!("unknown element {element}")))?;
        if local.nrows() != dofs.len() || local.ncols() != dofs.len() {
            return Err(FemError::assembly(format!(
                "element {element} matrix is {}x{}, expected {n}x{n}",
                local.nrows(),
                local.ncols(),
                n = dofs.len()
            )));
        }
        for (a, &ga) in dofs.iter().enumerate() {
            for (b, &gb) in dofs.iter().enumerate() {
                global[(ga, gb)] += local[(a, b)];
            }
        }
        Ok(())
    }
}

/// Discrete system `M a + C v + K u = f` at one instant, with Dirichlet
/// constraints kept aside as `(dof, value)` pairs.
///
/// `mass` is `None` for first-order (parabolic) models.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledSystem {
    pub time: f64,
    pub mass: Option<DMatrix<f64>>,
    pub damping: DMatrix<f64>,
    pub stiffness: DMatrix<f64>,
    pub load: DVector<f64>,
    pub constraints: Vec<(usize, f64)>,
}

impl AssembledSystem {
    /// Zero system of `dofs` unknowns.
    pub fn zeros(time: f64, dofs: usize, second_order: bool) -> Self {
        Self {
            time,
            mass: second_order.then(|| DMatrix::zeros(dofs, dofs)),
            damping: DMatrix::zeros(dofs, dofs),
            stiffness: DMatrix::zeros(dofs, dofs),
            load: DVector::zeros(dofs),
            constraints: Vec::new(),
        }
    }

    pub fn dof_count(&self) -> usize {
        self.load.len()
    }

    pub fn is_second_order(&self) -> bool {
        self.mass.is_some()
    }

    /// Prescribe `value` on `dof`; a later constraint on the same dof wins.
    pub fn constrain(&mut self, dof: usize, value: f64) {
        match self.constraints.iter_mut().find(|(d, _)| *d == dof) {
            Some(existing) => existing.1 = value,
            None => self.constraints.push((dof, value)),
        }
    }

    pub fn check_dimensions(&self) -> FemResult<()> {
        let n = self.dof_count();
        let square = |m: &DMatrix<f64>| m.nrows() == n && m.ncols() == n;
        if !square(&self.damping) || !square(&self.stiffness) || !self.mass.as_ref().is_none_or(square) {
            return Err(FemError::assembly(format!(
                "system matrices do not match {n} dofs"
            )));
        }
        if let Some(&(dof, _)) = self.constraints.iter().find(|(d, _)| *d >= n) {
            return Err(FemError::assembly(format!("constraint on missing dof {dof}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(elements: usize) -> AssemblyMap {
        let mut map = AssemblyMap::new(elements + 1);
        for e in 0..elements {
            map.push_element(vec![e, e + 1]).unwrap();
        }
        map
    }

    #[test]
    fn chain_map_is_consistent() {
        let map = chain(3);
        assert_eq!(map.global(2, 1), Some(3));
        assert_eq!(map.global(3, 0), None);
        map.check(3, 2).unwrap();
    }

    #[test]
    fn inconsistent_maps_are_reported() {
        let mut map = AssemblyMap::new(4);
        assert!(map.push_element(vec![3, 4]).is_err());
        map.push_element(vec![0, 1]).unwrap();
        map.push_element(vec![1, 2]).unwrap();
        // dof 3 is never reached
        assert!(matches!(map.check(2, 2), Err(FemError::Assembly { .. })));
        assert!(map.check(3, 2).is_err());
    }

    #[test]
    fn scatter_accumulates_shared_dofs() {
        let map = chain(2);
        let local = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
        let mut global = DMatrix::zeros(3, 3);
        map.scatter_matrix(0, &local, &mut global).unwrap();
        map.scatter_matrix(1, &local, &mut global).unwrap();
        assert_eq!(global[(1, 1)], 2.0);
        assert_eq!(global[(0, 2)], 0.0);
    }

    #[test]
    fn later_constraint_replaces_earlier() {
        let mut system = AssembledSystem::zeros(0.0, 3, false);
        system.constrain(0, 1.0);
        system.constrain(0, 2.0);
        assert_eq!(system.constraints, vec![(0, 2.0)]);
        system.check_dimensions().unwrap();
        system.constrain(5, 0.0);
        assert!(system.check_dimensions().is_err());
    }
}
