//! Dependency Graph
//!
//! The graph induced by following feature dependencies from one or more
//! roots. Edges point from a feature to the features it depends on.
//!
//! # Construction
//!
//! Construction walks the dependency maps with an explicit stack and an
//! identity-keyed expanded set. Each feature is expanded at most once, so
//! shared sub-graphs are visited once and cycles cannot make construction
//! loop. Construction never fails: a cyclic graph is still built so that it
//! can be inspected, and only [`DependencyGraph::assert_acyclic`] rejects it.
//!
//! # Representation
//!
//! Nodes live in an insertion-ordered map keyed by [`FeatureId`]. Each node
//! keeps both its dependencies (outgoing edges) and its dependents
//! (incoming edges), giving O(1) access in both directions for the cycle
//! search and the topological sort.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, error};

use super::snapshot::GraphSnapshot;
use crate::error::{FeatureError, FeatureResult};
use crate::feature::{Feature, FeatureId};

/// A node and its adjacency lists.
struct GraphNode<T> {
    feature: Feature<T>,
    /// Features this node depends on (outgoing edges).
    dependencies: Vec<FeatureId>,
    /// Features depending on this node (incoming edges).
    dependents: Vec<FeatureId>,
}

impl<T> GraphNode<T> {
    fn new(feature: Feature<T>) -> Self {
        Self {
            feature,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        }
    }
}

/// Directed graph of features and their dependencies.
pub struct DependencyGraph<T> {
    roots: Vec<FeatureId>,
    nodes: IndexMap<FeatureId, GraphNode<T>>,
}

impl<T> DependencyGraph<T> {
    /// Build the dependency graph of a single feature.
    pub fn build(root: &Feature<T>) -> Self {
        Self::build_many(std::slice::from_ref(root))
    }

    /// Build the union of the dependency graphs of several features.
    pub fn build_many(roots: &[Feature<T>]) -> Self {
        let mut graph = Self {
            roots: Vec::with_capacity(roots.len()),
            nodes: IndexMap::new(),
        };
        let mut expanded = HashSet::new();

        for root in roots {
            graph.add_node(root);
            if !graph.roots.contains(&root.id()) {
                graph.roots.push(root.id());
            }

            let mut stack = vec![root.clone()];
            while let Some(feature) = stack.pop() {
                if !expanded.insert(feature.id()) {
                    continue;
                }

                for (_, dependency) in feature.dependencies() {
                    graph.add_node(&dependency);
                    graph.add_edge(feature.id(), dependency.id());
                    if !expanded.contains(&dependency.id()) {
                        stack.push(dependency);
                    }
                }
            }
        }

        debug!(
            roots = graph.roots.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );
        graph
    }

    fn add_node(&mut self, feature: &Feature<T>) {
        self.nodes
            .entry(feature.id())
            .or_insert_with(|| GraphNode::new(feature.clone()));
    }

    /// Record `from -> to`. Both nodes must already exist; repeated edges
    /// are ignored.
    fn add_edge(&mut self, from: FeatureId, to: FeatureId) {
        match self.nodes.get_mut(&from) {
            Some(node) if !node.dependencies.contains(&to) => node.dependencies.push(to),
            _ => return,
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            node.dependents.push(from);
        }
    }

    /// The features the graph was built from.
    pub fn roots(&self) -> impl Iterator<Item = &Feature<T>> {
        self.roots.iter().filter_map(|id| self.feature(id))
    }

    /// The first feature the graph was built from.
    pub fn root(&self) -> Option<&Feature<T>> {
        self.roots.first().and_then(|id| self.feature(id))
    }

    fn feature(&self, id: &FeatureId) -> Option<&Feature<T>> {
        self.nodes.get(id).map(|node| &node.feature)
    }

    /// Number of features in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of dependency edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.dependencies.len()).sum()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if `feature` (by identity) is a node of the graph.
    pub fn contains(&self, feature: &Feature<T>) -> bool {
        self.nodes.contains_key(&feature.id())
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Feature<T>> {
        self.nodes.values().map(|node| &node.feature)
    }

    /// Edges as `(feature, dependency)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&Feature<T>, &Feature<T>)> {
        self.nodes.values().flat_map(move |node| {
            node.dependencies
                .iter()
                .filter_map(move |id| self.feature(id).map(|dependency| (&node.feature, dependency)))
        })
    }

    /// True if `feature` depends directly on `dependency`.
    pub fn has_edge(&self, feature: &Feature<T>, dependency: &Feature<T>) -> bool {
        self.nodes
            .get(&feature.id())
            .is_some_and(|node| node.dependencies.contains(&dependency.id()))
    }

    /// Direct dependencies of `feature` within this graph.
    pub fn dependencies_of(&self, feature: &Feature<T>) -> Vec<Feature<T>> {
        self.neighbours(feature, |node| &node.dependencies)
    }

    /// Features of this graph depending directly on `feature`.
    pub fn dependents_of(&self, feature: &Feature<T>) -> Vec<Feature<T>> {
        self.neighbours(feature, |node| &node.dependents)
    }

    fn neighbours<F>(&self, feature: &Feature<T>, select: F) -> Vec<Feature<T>>
    where
        F: Fn(&GraphNode<T>) -> &Vec<FeatureId>,
    {
        self.nodes
            .get(&feature.id())
            .map(|node| {
                select(node)
                    .iter()
                    .filter_map(|id| self.feature(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes without dependencies: the leaf inputs of the graph, usually
    /// column references. Returned in insertion order.
    pub fn root_dependencies(&self) -> Vec<Feature<T>> {
        self.nodes
            .values()
            .filter(|node| node.dependencies.is_empty())
            .map(|node| node.feature.clone())
            .collect()
    }

    /// Find a cycle, returned as a path that starts and ends on the same
    /// feature.
    ///
    /// Depth-first search with three-colour marking:
    /// - White (not visited): not in `visited`
    /// - Gray (visiting): in `on_stack`
    /// - Black (done): in `visited` but not in `on_stack`
    ///
    /// `path` mirrors `on_stack` in visiting order and is only read to
    /// report the cycle.
    pub fn find_cycle(&self) -> Option<Vec<Feature<T>>> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for id in self.nodes.keys() {
            if visited.contains(id) {
                continue;
            }
            if let Some(cycle) = self.dfs_find_cycle(*id, &mut visited, &mut on_stack, &mut path) {
                return Some(cycle.iter().filter_map(|id| self.feature(id).cloned()).collect());
            }
        }

        None
    }

    fn dfs_find_cycle(
        &self,
        id: FeatureId,
        visited: &mut HashSet<FeatureId>,
        on_stack: &mut HashSet<FeatureId>,
        path: &mut Vec<FeatureId>,
    ) -> Option<Vec<FeatureId>> {
        let node = self.nodes.get(&id)?;
        visited.insert(id);
        on_stack.insert(id);
        path.push(id);

        for &dependency in &node.dependencies {
            if on_stack.contains(&dependency) {
                // Back edge
                let start = path.iter().rposition(|&on_path| on_path == dependency)?;
                let mut cycle = path[start..].to_vec();
                cycle.push(dependency);
                return Some(cycle);
            }
            if !visited.contains(&dependency) {
                if let Some(cycle) = self.dfs_find_cycle(dependency, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }

        on_stack.remove(&id);
        path.pop();
        None
    }

    /// True if no dependency path leads back to where it started.
    pub fn is_acyclic(&self) -> bool {
        self.find_cycle().is_none()
    }

    /// Fail with [`FeatureError::CyclicDependency`] if the graph has a cycle.
    ///
    /// The whole graph is searched; construction alone never proves the
    /// graph is acyclic.
    pub fn assert_acyclic(&self) -> FeatureResult<()> {
        let Some(cycle) = self.find_cycle() else {
            return Ok(());
        };

        let path = cycle
            .iter()
            .map(|feature| feature.name())
            .collect::<Vec<_>>()
            .join(" -> ");
        let root = self
            .roots()
            .map(|feature| feature.name())
            .collect::<Vec<_>>()
            .join(", ");

        let err = FeatureError::cyclic(root.clone(), path);
        error!(feature = %root, error = %err, "Error in Feature definition");
        Err(err)
    }

    /// Every node ordered so that dependencies come before their dependents.
    ///
    /// Kahn's algorithm; among ready nodes the insertion order wins, so
    /// the result is deterministic.
    pub fn topological_order(&self) -> FeatureResult<Vec<Feature<T>>> {
        self.assert_acyclic()?;

        let mut pending: HashMap<FeatureId, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| (*id, node.dependencies.len()))
            .collect();
        let mut queue: VecDeque<FeatureId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.dependencies.is_empty())
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            order.push(node.feature.clone());

            for dependent in &node.dependents {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        Ok(order)
    }

    /// A serialisable view of the graph for diagnostics.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(
            self.roots().map(Feature::id),
            self.nodes(),
            self.edges().map(|(feature, dependency)| (feature.id(), dependency.id())),
        )
    }
}
