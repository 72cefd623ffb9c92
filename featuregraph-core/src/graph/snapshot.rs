//! Graph Snapshots
//!
//! Plain-data view of a dependency graph, decoupled from the feature
//! handles, so tooling can print or ship a graph (cyclic or not) as JSON.

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureId};

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A reference to an input column.
    Column,
    /// A feature with compute logic.
    Computed,
}

/// One node of a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: u64,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index_columns: Vec<String>,
}

impl<T> From<&Feature<T>> for NodeSnapshot {
    fn from(feature: &Feature<T>) -> Self {
        Self {
            id: feature.id().raw(),
            name: feature.name().to_string(),
            kind: if feature.is_column() {
                NodeKind::Column
            } else {
                NodeKind::Computed
            },
            version: feature.version().map(str::to_string),
            index_columns: feature.index_columns().to_vec(),
        }
    }
}

/// Serialisable nodes and `(feature, dependency)` edges of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub roots: Vec<u64>,
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<(u64, u64)>,
}

impl GraphSnapshot {
    pub(crate) fn new<'a, T: 'a>(
        roots: impl Iterator<Item = FeatureId>,
        nodes: impl Iterator<Item = &'a Feature<T>>,
        edges: impl Iterator<Item = (FeatureId, FeatureId)>,
    ) -> Self {
        Self {
            roots: roots.map(|id| id.raw()).collect(),
            nodes: nodes.map(NodeSnapshot::from).collect(),
            edges: edges.map(|(from, to)| (from.raw(), to.raw())).collect(),
        }
    }

    /// Look up a node by name. Names are not unique; the first match wins.
    pub fn node_named(&self, name: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Serialize the snapshot to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the snapshot to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot previously written with `to_json`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::graph::DependencyGraph;

    type Rows = Vec<i64>;

    fn identity(rows: &Rows) -> Result<Rows, BoxError> {
        Ok(rows.clone())
    }

    #[test]
    fn snapshot_describes_nodes_and_edges() {
        let x = Feature::<Rows>::column("x");
        let f = Feature::builder("f")
            .version("3")
            .depends_on("x", &x)
            .compute(identity)
            .build()
            .unwrap();

        let snapshot = DependencyGraph::build(&f).snapshot();

        assert_eq!(snapshot.roots, vec![f.id().raw()]);
        assert_eq!(snapshot.edges, vec![(f.id().raw(), x.id().raw())]);
        let node = snapshot.node_named("f").unwrap();
        assert_eq!(node.kind, NodeKind::Computed);
        assert_eq!(node.version.as_deref(), Some("3"));
        assert_eq!(snapshot.node_named("x").map(|n| n.kind), Some(NodeKind::Column));
    }

    #[test]
    fn cyclic_graph_can_be_exported() {
        let looping = Feature::<Rows>::cyclic(|this| {
            Ok(Feature::builder("looping").depends_on("me", this).compute(identity))
        })
        .unwrap();

        let snapshot = looping.dependency_graph().snapshot();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""kind":"computed""#));

        let parsed = GraphSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
