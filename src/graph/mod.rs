//! File Dependency Graph
//!
//! Import graph between host files, built from a fully resolved
//! `MessageRegistry`. Each node is a file that declares at least one emitted
//! message; internal messages never appear in the graph.
//! An edge `a -> b` means a message in `a` has a field referencing a message
//! declared in `b`.
//!
//! Cycles in this graph are eliminated by `analysis::plan_merges`.

pub mod analysis;

pub use analysis::{plan_merges, MergeMap, MergePlan, OutputUnit};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::registry::MessageRegistry;

/// Host file name (e.g. `user.go`)
pub type FileId = String;

/// The file-level import graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Node weight is the file name; edges are deduplicated
    pub(crate) graph: DiGraph<FileId, ()>,

    /// Node index lookup: file -> NodeIndex
    pub(crate) node_indices: HashMap<FileId, NodeIndex>,

    /// Messages declared in each file, in declaration order
    pub(crate) messages: HashMap<FileId, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from a resolved registry
    pub fn build(registry: &MessageRegistry) -> Self {
        let mut graph = Self::default();

        for message in registry.emitted() {
            graph.add_file(&message.origin_file);
            graph
                .messages
                .entry(message.origin_file.clone())
                .or_default()
                .push(message.name.clone());
        }

        for message in registry.emitted() {
            for field in message.fields() {
                for referenced in field.schema_type.message_refs() {
                    let Some(target) = registry.get(referenced).filter(|t| t.is_emitted()) else {
                        continue;
                    };
                    if target.origin_file != message.origin_file {
                        graph.add_edge(&message.origin_file, &target.origin_file);
                    }
                }
            }
        }

        debug!(
            files = graph.file_count(),
            edges = graph.edge_count(),
            "built file dependency graph"
        );
        graph
    }

    /// Graph of output units after cycle merging
    pub fn from_units(units: &[OutputUnit]) -> Self {
        let mut graph = Self::default();
        for unit in units {
            graph.add_file(&unit.file);
            graph.messages.insert(unit.file.clone(), unit.messages.clone());
            for import in &unit.imports {
                graph.add_edge(&unit.file, import);
            }
        }
        graph
    }

    /// Add a file node if not present
    pub fn add_file(&mut self, file: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(file) {
            return idx;
        }
        let idx = self.graph.add_node(file.to_string());
        self.node_indices.insert(file.to_string(), idx);
        idx
    }

    /// Add a deduplicated edge `from -> to`, creating nodes as needed
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.add_file(from);
        let b = self.add_file(to);
        self.graph.update_edge(a, b, ());
    }

    // ========== Public API ==========

    /// Get file count
    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `file` is a node of the graph
    pub fn contains(&self, file: &str) -> bool {
        self.node_indices.contains_key(file)
    }

    /// All files, sorted
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    /// Files imported by `file`, sorted
    pub fn imports_of(&self, file: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(file) else {
            return Vec::new();
        };

        let targets: BTreeSet<&str> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| self.graph.node_weight(e.target()))
            .map(String::as_str)
            .collect();
        targets.into_iter().collect()
    }

    /// Files that import `file`, sorted
    pub fn importers_of(&self, file: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(file) else {
            return Vec::new();
        };

        let sources: BTreeSet<&str> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| self.graph.node_weight(e.source()))
            .map(String::as_str)
            .collect();
        sources.into_iter().collect()
    }

    /// Messages declared in `file`
    pub fn messages_in(&self, file: &str) -> &[String] {
        self.messages.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Render the graph in GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph FileGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fillcolor=\"#E3F2FD\"];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n");
        output.push('\n');

        for file in self.files() {
            let messages = self.messages_in(file);
            let label = if messages.is_empty() {
                file.to_string()
            } else {
                format!("{}\\n{}", file, messages.join(", "))
            };
            output.push_str(&format!("  \"{}\" [label=\"{}\"];\n", dot_id(file), label));
        }

        output.push('\n');

        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_references()
            .filter_map(|e| {
                let source = self.graph.node_weight(e.source())?;
                let target = self.graph.node_weight(e.target())?;
                Some((source.as_str(), target.as_str()))
            })
            .collect();
        edges.sort_unstable();

        for (source, target) in edges {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", dot_id(source), dot_id(target)));
        }

        output.push_str("}\n");
        output
    }
}

fn dot_id(file: &str) -> String {
    file.replace(['/', '.', '-'], "_")
}
