//! Graph-specific error types.

use wr_core::{EdgeId, VertexId};

/// Graph construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A vertex with this ID is already part of the graph.
    #[error("Duplicate vertex identity {0}")]
    DuplicateVertex(VertexId),

    /// An edge with this ID is already part of the graph.
    #[error("Duplicate edge identity {0}")]
    DuplicateEdge(EdgeId),

    /// Vertex lookup miss.
    #[error("Vertex {0} not found")]
    VertexNotFound(VertexId),

    /// Edge lookup miss.
    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// An edge refers to a vertex that doesn't exist.
    #[error("Edge {edge} refers to non-existent vertex {vertex}")]
    DanglingEdge { edge: EdgeId, vertex: VertexId },
}

impl GraphError {
    /// True for identity collisions.
    pub fn is_duplicate_identity(&self) -> bool {
        matches!(
            self,
            GraphError::DuplicateVertex(_) | GraphError::DuplicateEdge(_)
        )
    }

    /// True for lookup misses (including dangling edge endpoints).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::VertexNotFound(_)
                | GraphError::EdgeNotFound(_)
                | GraphError::DanglingEdge { .. }
        )
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
