//! One-dimensional meshes.

use crate::assembly::AssemblyMap;
use crate::error::{FemError, FemResult};

/// Line mesh of two-node elements; element `e` spans nodes `e` and `e + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh1d {
    nodes: Vec<f64>,
}

impl Mesh1d {
    /// Mesh from node coordinates, which must be strictly increasing.
    pub fn new(nodes: Vec<f64>) -> FemResult<Self> {
        if nodes.len() < 2 {
            return Err(FemError::invalid("mesh needs at least two nodes"));
        }
        if nodes.iter().any(|x| !x.is_finite()) || nodes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FemError::invalid("mesh nodes must be finite and strictly increasing"));
        }
        Ok(Self { nodes })
    }

    /// `elements` equal elements on `[start, end]`.
    pub fn uniform(start: f64, end: f64, elements: usize) -> FemResult<Self> {
        let nodes = wr_core::uniform_grid(start, end, elements)?;
        Self::new(nodes)
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn element_nodes(&self, element: usize) -> (usize, usize) {
        (element, element + 1)
    }

    pub fn element_length(&self, element: usize) -> f64 {
        self.nodes[element + 1] - self.nodes[element]
    }

    /// Dof map with one dof per node.
    pub fn assembly_map(&self) -> FemResult<AssemblyMap> {
        let mut map = AssemblyMap::new(self.node_count());
        for e in 0..self.element_count() {
            let (a, b) = self.element_nodes(e);
            map.push_element(vec![a, b])?;
        }
        Ok(map)
    }

    /// Index of the last node.
    pub fn last_node(&self) -> usize {
        self.nodes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_mesh() {
        let mesh = Mesh1d::uniform(0.0, 1.0, 4).unwrap();
        assert_eq!(mesh.node_count(), 5);
        assert_eq!(mesh.element_count(), 4);
        assert!((mesh.element_length(2) - 0.25).abs() < 1e-15);
        assert_eq!(mesh.nodes()[4], 1.0);
        mesh.assembly_map().unwrap().check(4, 2).unwrap();
    }

    #[test]
    fn rejects_degenerate_meshes() {
        assert!(Mesh1d::new(vec![0.0]).is_err());
        assert!(Mesh1d::new(vec![0.0, 0.0]).is_err());
        assert!(Mesh1d::uniform(1.0, 0.0, 3).is_err());
        assert!(Mesh1d::uniform(0.0, 1.0, 0).is_err());
    }
}
