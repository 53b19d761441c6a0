//! Composition graph over catalog definitions.
//!
//! Edges point from a parent definition to each child it lists. The catalog
//! keeps this graph acyclic; the checks here are how it does so.

use std::collections::HashMap;
use std::hash::Hash;

use lab_core::entities::ExamDefinition;
use lab_core::ids::DefinitionId;
use rustworkx_core::petgraph::algo::{has_path_connecting, is_cyclic_directed, toposort};
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use rustworkx_core::petgraph::Direction;
use rustworkx_core::petgraph::visit::EdgeRef;

/// Directed parent → child graph keyed by `K`.
///
/// The catalog uses [`DefinitionId`] keys. Loaders that reference children
/// by code before ids exist can key the graph by code instead.
#[derive(Debug, Clone)]
pub struct CompositionGraph<K = DefinitionId> {
    graph: DiGraph<K, ()>,
    index: HashMap<K, NodeIndex>,
}

impl<K> Default for CompositionGraph<K> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }
}

impl CompositionGraph<DefinitionId> {
    /// Build the graph of a set of definitions.
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = &'a ExamDefinition>,
    {
        let mut graph = Self::default();
        for def in definitions {
            graph.add_node(def.id);
            for child in def.children() {
                graph.add_edge(def.id, *child);
            }
        }
        graph
    }
}

impl<K> CompositionGraph<K>
where
    K: Clone + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning the existing index if already present.
    pub fn add_node(&mut self, key: K) -> NodeIndex {
        if let Some(idx) = self.index.get(&key) {
            return *idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key, idx);
        idx
    }

    /// Record that `parent` lists `child`.
    pub fn add_edge(&mut self, parent: K, child: K) {
        let p = self.add_node(parent);
        let c = self.add_node(child);
        self.graph.update_edge(p, c, ());
    }

    /// Drop every outgoing edge of `parent`, e.g. before its child list is replaced.
    pub fn clear_children(&mut self, parent: &K) {
        let Some(&p) = self.index.get(parent) else {
            return;
        };
        let edges: Vec<_> = self
            .graph
            .edges_directed(p, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in edges {
            self.graph.remove_edge(edge);
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Whether adding the edge `parent → child` would close a cycle.
    ///
    /// A self-edge always does. Otherwise it does iff `parent` is already
    /// reachable from `child`.
    #[must_use]
    pub fn would_cycle(&self, parent: &K, child: &K) -> bool {
        if parent == child {
            return true;
        }
        match (self.index.get(child), self.index.get(parent)) {
            (Some(&c), Some(&p)) => has_path_connecting(&self.graph, c, p, None),
            _ => false,
        }
    }

    /// Keys of the nodes that list `key` as a child.
    #[must_use]
    pub fn parents(&self, key: &K) -> Vec<K> {
        self.index.get(key).map_or_else(Vec::new, |&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|p| self.graph[p].clone())
                .collect()
        })
    }

    /// Dependency order with every child before the parents that list it.
    /// `None` if the graph has a cycle.
    #[must_use]
    pub fn toposort(&self) -> Option<Vec<K>> {
        let sorted = toposort(&self.graph, None).ok()?;
        Some(
            sorted
                .into_iter()
                .rev()
                .map(|idx| self.graph[idx].clone())
                .collect(),
        )
    }

    /// One key on a cycle, if any.
    #[must_use]
    pub fn cycle_member(&self) -> Option<K> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].clone())
    }
}
