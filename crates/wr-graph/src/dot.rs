//! Graphviz (DOT) export.

use std::fmt::Write as _;
use std::io;

use crate::graph::{Edge, Graph, Vertex};

/// DOT output settings.
#[derive(Debug, Clone, Copy)]
pub struct DotSettings {
    /// Emit `digraph` with `->` edges, or `graph` with `--` edges.
    pub directed: bool,
}

impl Default for DotSettings {
    fn default() -> Self {
        Self { directed: true }
    }
}

impl<V, E> Graph<V, E> {
    /// Render the graph in DOT format, labelling items with the given closures.
    pub fn to_dot_with<FV, FE>(&self, settings: DotSettings, vertex_label: FV, edge_label: FE) -> String
    where
        FV: Fn(&Vertex<V>) -> String,
        FE: Fn(&Edge<E>) -> String,
    {
        let (keyword, arrow) = if settings.directed {
            ("digraph", "->")
        } else {
            ("graph", "--")
        };

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{keyword} {{");
        for vertex in self.vertices() {
            let _ = writeln!(
                out,
                "  {} [label=\"{}\"];",
                vertex.id,
                escape(&vertex_label(vertex))
            );
        }
        for edge in self.edges() {
            let _ = writeln!(
                out,
                "  {} {arrow} {} [label=\"{}\"];",
                edge.source,
                edge.target,
                escape(&edge_label(edge))
            );
        }
        out.push_str("}\n");
        out
    }

    /// Render the graph using vertex/edge IDs as labels.
    pub fn to_dot(&self, settings: DotSettings) -> String {
        self.to_dot_with(settings, |v| v.id.to_string(), |e| e.id.to_string())
    }

    /// Write the DOT rendering to any writer.
    pub fn write_dot<W, FV, FE>(
        &self,
        writer: &mut W,
        settings: DotSettings,
        vertex_label: FV,
        edge_label: FE,
    ) -> io::Result<()>
    where
        W: io::Write,
        FV: Fn(&Vertex<V>) -> String,
        FE: Fn(&Edge<E>) -> String,
    {
        writer.write_all(self.to_dot_with(settings, vertex_label, edge_label).as_bytes())
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
