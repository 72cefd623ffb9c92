//! Dependency Graph Engine
//!
//! This module turns a feature's declared dependencies into a directed
//! graph and answers questions about it.
//!
//! # Overview
//!
//! - Nodes are features, keyed by identity. Column references are leaves.
//! - Edges mean "depends on": if A depends on B, there is an edge from A to B.
//!
//! Graphs are built on demand for each query and never cached; they are a
//! disposable view over immutable features, so concurrent queries over the
//! same features are always safe.
//!
//! # Design Decisions
//!
//! 1. Construction and validation are separate steps. Building a graph
//!    never fails, even on cycles, which lets diagnostic tooling inspect a
//!    broken graph before [`assert_acyclic`] rejects it.
//!
//! 2. Validation searches the whole graph for a back edge instead of
//!    trusting how construction terminated.
//!
//! 3. Ordering follows dependency declaration order, so every query is
//!    deterministic for a given set of features.

mod dependency_graph;
mod snapshot;

pub use dependency_graph::DependencyGraph;
pub use snapshot::{GraphSnapshot, NodeKind, NodeSnapshot};

use tracing::debug;

use crate::error::FeatureResult;
use crate::feature::Feature;

/// Build the dependency graph of `root`.
pub fn build<T>(root: &Feature<T>) -> DependencyGraph<T> {
    DependencyGraph::build(root)
}

/// Fail with [`FeatureError::CyclicDependency`] if the dependencies of
/// `root` do not form a DAG.
///
/// [`FeatureError::CyclicDependency`]: crate::FeatureError::CyclicDependency
pub fn assert_acyclic<T>(root: &Feature<T>) -> FeatureResult<()> {
    DependencyGraph::build(root).assert_acyclic()
}

/// Leaves of `root`'s dependency graph: nodes with no dependencies.
pub fn root_dependencies<T>(root: &Feature<T>) -> Vec<Feature<T>> {
    DependencyGraph::build(root).root_dependencies()
}

/// The declared name of a feature.
pub fn name<T>(feature: &Feature<T>) -> &str {
    feature.name()
}

/// Every feature needed to compute `features`, dependencies first.
///
/// Shared dependencies appear once. Fails if the combined graph has a
/// cycle.
pub fn plan<T>(features: &[Feature<T>]) -> FeatureResult<Vec<Feature<T>>> {
    let order = DependencyGraph::build_many(features).topological_order()?;
    debug!(
        requested = features.len(),
        planned = order.len(),
        "Planned feature computation"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, FeatureError};

    type Rows = Vec<i64>;

    fn identity(rows: &Rows) -> Result<Rows, BoxError> {
        Ok(rows.clone())
    }

    #[test]
    fn free_functions_agree_with_graph() {
        let x = Feature::<Rows>::column("x");
        let f = Feature::builder("f")
            .depends_on("x", &x)
            .compute(identity)
            .build()
            .unwrap();

        assert_eq!(name(&f), "f");
        assert_eq!(build(&f).node_count(), 2);
        assert_eq!(root_dependencies(&f), vec![x]);
        assert!(assert_acyclic(&f).is_ok());
    }

    #[test]
    fn plan_orders_shared_closure() {
        let x = Feature::<Rows>::column("x");
        let f = Feature::builder("f")
            .depends_on("x", &x)
            .compute(identity)
            .build()
            .unwrap();
        let g = Feature::builder("g")
            .depends_on("f", &f)
            .depends_on("x", &x)
            .compute(identity)
            .build()
            .unwrap();

        let order = plan(&[g.clone(), f.clone()]).unwrap();
        assert_eq!(order, vec![x, f, g]);
    }

    #[test]
    fn plan_rejects_cycles() {
        let looping = Feature::<Rows>::cyclic(|this| {
            Ok(Feature::builder("looping").depends_on("me", this).compute(identity))
        })
        .unwrap();

        assert!(matches!(
            plan(&[looping]),
            Err(FeatureError::CyclicDependency { .. })
        ));
    }
}
