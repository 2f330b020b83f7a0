//! Core graph data structures.

use std::collections::HashMap;
use wr_core::{EdgeId, VertexId};

use crate::error::{GraphError, GraphResult};

/// A vertex: identity, incident edges and a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex<V> {
    pub id: VertexId,
    /// Incident edge IDs (both directions), in insertion order.
    pub(crate) edges: Vec<EdgeId>,
    pub data: V,
}

impl<V> Vertex<V> {
    /// Edges that start or end at this vertex.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

/// A directed edge between two existing vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub data: E,
}

impl<E> Edge<E> {
    /// Get the `(source, target)` pair.
    pub fn vertices(&self) -> (VertexId, VertexId) {
        (self.source, self.target)
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint.
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.source {
            Some(self.target)
        } else if vertex == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Directed graph with hashable vertex/edge identities.
///
/// Vertices and edges live in flat vectors (insertion order) with an
/// id -> slot index, so iteration order is deterministic and lookups are O(1).
/// Items are never removed.
#[derive(Debug, Clone)]
pub struct Graph<V, E> {
    vertices: Vec<Vertex<V>>,
    edges: Vec<Edge<E>>,
    vertex_slots: HashMap<VertexId, usize>,
    edge_slots: HashMap<EdgeId, usize>,
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_slots: HashMap::new(),
            edge_slots: HashMap::new(),
        }
    }
}

impl<V, E> Graph<V, E> {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex. Fails if the ID is already taken.
    pub fn add_vertex(&mut self, id: VertexId, data: V) -> GraphResult<&mut Vertex<V>> {
        if self.vertex_slots.contains_key(&id) {
            return Err(GraphError::DuplicateVertex(id));
        }
        let slot = self.vertices.len();
        self.vertices.push(Vertex {
            id,
            edges: Vec::new(),
            data,
        });
        self.vertex_slots.insert(id, slot);
        Ok(&mut self.vertices[slot])
    }

    /// Insert a directed edge `source -> target`.
    ///
    /// Both endpoints must already exist; the graph is left untouched on error.
    pub fn add_edge(
        &mut self,
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        data: E,
    ) -> GraphResult<&mut Edge<E>> {
        if self.edge_slots.contains_key(&id) {
            return Err(GraphError::DuplicateEdge(id));
        }
        let source_slot = self.slot_for_endpoint(id, source)?;
        let target_slot = self.slot_for_endpoint(id, target)?;

        let slot = self.edges.len();
        self.edges.push(Edge {
            id,
            source,
            target,
            data,
        });
        self.edge_slots.insert(id, slot);

        self.vertices[source_slot].edges.push(id);
        if target_slot != source_slot {
            self.vertices[target_slot].edges.push(id);
        }
        Ok(&mut self.edges[slot])
    }

    fn slot_for_endpoint(&self, edge: EdgeId, vertex: VertexId) -> GraphResult<usize> {
        self.vertex_slots
            .get(&vertex)
            .copied()
            .ok_or(GraphError::DanglingEdge { edge, vertex })
    }

    /// Return all vertices in insertion order.
    pub fn vertices(&self) -> &[Vertex<V>] {
        &self.vertices
    }

    /// Return all edges in insertion order.
    pub fn edges(&self) -> &[Edge<E>] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex_slots.contains_key(&id)
    }

    /// Get a vertex by ID.
    pub fn vertex(&self, id: VertexId) -> GraphResult<&Vertex<V>> {
        self.vertex_slots
            .get(&id)
            .map(|&slot| &self.vertices[slot])
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// Get a vertex by ID, mutably.
    pub fn vertex_mut(&mut self, id: VertexId) -> GraphResult<&mut Vertex<V>> {
        match self.vertex_slots.get(&id) {
            Some(&slot) => Ok(&mut self.vertices[slot]),
            None => Err(GraphError::VertexNotFound(id)),
        }
    }

    /// Get an edge by ID.
    pub fn edge(&self, id: EdgeId) -> GraphResult<&Edge<E>> {
        self.edge_slots
            .get(&id)
            .map(|&slot| &self.edges[slot])
            .ok_or(GraphError::EdgeNotFound(id))
    }

    /// Get an edge by ID, mutably.
    pub fn edge_mut(&mut self, id: EdgeId) -> GraphResult<&mut Edge<E>> {
        match self.edge_slots.get(&id) {
            Some(&slot) => Ok(&mut self.edges[slot]),
            None => Err(GraphError::EdgeNotFound(id)),
        }
    }

    /// Edges incident to a vertex (either direction).
    pub fn incident_edges(&self, id: VertexId) -> GraphResult<impl Iterator<Item = &Edge<E>>> {
        let vertex = self.vertex(id)?;
        Ok(vertex
            .edges
            .iter()
            .map(move |edge_id| &self.edges[self.edge_slots[edge_id]]))
    }

    /// Vertices sharing an edge with `id`, ignoring direction.
    ///
    /// Sorted by ID and deduplicated.
    pub fn neighbors(&self, id: VertexId) -> GraphResult<Vec<VertexId>> {
        let mut neighbors: Vec<VertexId> = self
            .incident_edges(id)?
            .filter_map(|edge| edge.other(id))
            .filter(|&other| other != id)
            .collect();
        neighbors.sort();
        neighbors.dedup();
        Ok(neighbors)
    }

    /// Targets of edges leaving `id`.
    pub fn successors(&self, id: VertexId) -> GraphResult<Vec<VertexId>> {
        let mut successors: Vec<VertexId> = self
            .incident_edges(id)?
            .filter(|edge| edge.source == id)
            .map(|edge| edge.target)
            .collect();
        successors.sort();
        successors.dedup();
        Ok(successors)
    }

    /// First edge connecting `a` and `b` in either direction.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> GraphResult<Option<&Edge<E>>> {
        Ok(self
            .incident_edges(a)?
            .find(|edge| edge.other(a) == Some(b)))
    }
}
