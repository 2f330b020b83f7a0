//! wr-graph: generic coupling graph for partitioned solves.
//!
//! Provides:
//! - Directed graph of identified vertices and edges with attached payloads
//! - Arena storage with O(1) id lookup
//! - Graphviz (DOT) export
//! - Deterministic traversal orders for sequential update schemes
//!
//! # Example
//!
//! ```
//! use wr_core::Id;
//! use wr_graph::Graph;
//!
//! let mut graph: Graph<&str, f64> = Graph::new();
//! graph.add_vertex(Id::from_index(0), "left").unwrap();
//! graph.add_vertex(Id::from_index(1), "right").unwrap();
//! graph.add_edge(Id::from_index(0), Id::from_index(0), Id::from_index(1), 1.0).unwrap();
//!
//! assert_eq!(graph.vertex_count(), 2);
//! assert_eq!(graph.neighbors(Id::from_index(0)).unwrap(), vec![Id::from_index(1)]);
//! ```

pub mod dot;
pub mod error;
pub mod graph;
pub mod traversal;

// Re-exports for ergonomics
pub use dot::DotSettings;
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, Graph, Vertex};
pub use traversal::breadth_first_order;
