//! File Graph Analysis
//!
//! Finds import cycles between files with a three-color depth-first search
//! and collapses every cyclic group into a single output unit.
//!
//! ## Algorithm
//!
//! 1. DFS over files in sorted order, successors sorted. A back-edge to a
//!    gray file closes a cycle: the files on the path from that file to the
//!    current one form a cyclic group.
//! 2. Groups that share a file are unioned.
//! 3. Each group is merged into its representative (`MergeTarget`); the
//!    graph is contracted and the search runs again until no cycle remains.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use super::{DependencyGraph, FileId};
use crate::config::MergeTarget;

// =============================================================================
// Merge Map
// =============================================================================

/// Original file -> file it is merged into. Absent files are emitted as-is.
///
/// Entries are kept transitive: every key maps directly to its final unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMap(BTreeMap<FileId, FileId>);

impl MergeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final output unit of `file`
    pub fn resolve<'a>(&'a self, file: &'a str) -> &'a str {
        self.0.get(file).map(String::as_str).unwrap_or(file)
    }

    /// Merge `file` into `into`, re-pointing anything already merged into `file`
    pub fn merge(&mut self, file: &str, into: &str) {
        if file == into {
            return;
        }
        for target in self.0.values_mut() {
            if target == file {
                *target = into.to_string();
            }
        }
        self.0.insert(file.to_string(), into.to_string());
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.0.get(file).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// =============================================================================
// Merge Plan
// =============================================================================

/// One schema file to emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputUnit {
    /// Host file the unit is named after
    pub file: FileId,
    /// Messages emitted in this unit
    pub messages: Vec<String>,
    /// Other units imported by this one, sorted
    pub imports: Vec<FileId>,
}

/// Result of cycle elimination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergePlan {
    pub merge_map: MergeMap,
    /// Output units sorted by file name
    pub units: Vec<OutputUnit>,
}

impl MergePlan {
    pub fn unit(&self, file: &str) -> Option<&OutputUnit> {
        self.units.iter().find(|u| u.file == file)
    }
}

// =============================================================================
// Three-Color DFS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

struct CycleFinder<'g> {
    graph: &'g DependencyGraph,
    colors: HashMap<&'g str, Color>,
    path: Vec<&'g str>,
    groups: Vec<BTreeSet<FileId>>,
}

impl<'g> CycleFinder<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        let colors = graph.files().into_iter().map(|f| (f, Color::White)).collect();
        Self {
            graph,
            colors,
            path: Vec::new(),
            groups: Vec::new(),
        }
    }

    fn color(&self, file: &str) -> Color {
        self.colors.get(file).copied().unwrap_or(Color::White)
    }

    fn run(mut self) -> Vec<BTreeSet<FileId>> {
        let graph = self.graph;
        for file in graph.files() {
            if self.color(file) == Color::White {
                self.visit(file);
            }
        }
        self.groups
    }

    fn visit(&mut self, file: &'g str) {
        self.colors.insert(file, Color::Gray);
        self.path.push(file);

        let graph = self.graph;
        for next in graph.imports_of(file) {
            match self.color(next) {
                Color::White => self.visit(next),
                Color::Gray => {
                    if let Some(start) = self.path.iter().position(|f| *f == next) {
                        let group: BTreeSet<FileId> =
                            self.path[start..].iter().map(|f| f.to_string()).collect();
                        if group.len() > 1 {
                            debug!(?group, "import cycle found");
                            self.groups.push(group);
                        }
                    }
                }
                Color::Black => {}
            }
        }

        self.path.pop();
        self.colors.insert(file, Color::Black);
    }
}

/// Cyclic file groups of a graph, overlapping groups unioned
pub fn find_cycle_groups(graph: &DependencyGraph) -> Vec<BTreeSet<FileId>> {
    union_overlapping(CycleFinder::new(graph).run())
}

fn union_overlapping(groups: Vec<BTreeSet<FileId>>) -> Vec<BTreeSet<FileId>> {
    let mut merged: Vec<BTreeSet<FileId>> = Vec::new();
    for mut group in groups {
        let mut i = 0;
        while i < merged.len() {
            if merged[i].is_disjoint(&group) {
                i += 1;
            } else {
                group.extend(merged.swap_remove(i));
            }
        }
        merged.push(group);
    }
    merged.sort();
    merged
}

// =============================================================================
// Merging
// =============================================================================

/// Eliminate every import cycle by merging cyclic file groups.
///
/// The returned units form an acyclic import graph.
pub fn plan_merges(graph: &DependencyGraph, target: MergeTarget) -> MergePlan {
    let mut merge_map = MergeMap::new();
    let mut current = graph.clone();

    loop {
        let groups = find_cycle_groups(&current);
        if groups.is_empty() {
            break;
        }

        for group in &groups {
            let Some(representative) = target.pick(group.iter().map(String::as_str)) else {
                continue;
            };
            warn!(files = ?group, into = representative, "merging cyclic files into one schema");
            for file in group {
                merge_map.merge(file, representative);
            }
        }

        current = contract(graph, &merge_map);
    }

    debug_assert!(!current.is_cyclic(), "merged file graph still cyclic");

    let units = current
        .files()
        .into_iter()
        .map(|file| OutputUnit {
            file: file.to_string(),
            messages: current.messages_in(file).to_vec(),
            imports: current.imports_of(file).into_iter().map(str::to_string).collect(),
        })
        .collect();

    MergePlan { merge_map, units }
}

/// Collapse `graph` according to `merge_map`. Edges inside a merged group are
/// dropped; edges leaving it are re-targeted to the group's unit.
fn contract(graph: &DependencyGraph, merge_map: &MergeMap) -> DependencyGraph {
    let mut reduced = DependencyGraph::default();

    for file in graph.files() {
        let unit = merge_map.resolve(file);
        reduced.add_file(unit);
        reduced
            .messages
            .entry(unit.to_string())
            .or_default()
            .extend(graph.messages_in(file).iter().cloned());
    }

    for file in graph.files() {
        let from = merge_map.resolve(file);
        for import in graph.imports_of(file) {
            let to = merge_map.resolve(import);
            if from != to {
                reduced.add_edge(from, to);
            }
        }
    }

    reduced
}
