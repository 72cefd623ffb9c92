//! Featuregraph Core
//!
//! This crate provides a feature dependency and computation model: named,
//! versioned computations over tables, the dependencies between them, and
//! the machinery to validate and execute them.
//! It implements:
//!
//! - Feature descriptors with identity-based equality
//! - Dependency graph construction, cycle detection and leaf discovery
//! - Dependency-ordered planning across several features
//! - An in-memory table and a feature store executing features over it
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `feature`: Feature descriptors and their builder
//! - `graph`: Dependency graph engine and planning
//! - `table`: Positionally indexed in-memory table
//! - `store`: Feature store trait and the in-memory executor
//! - `registry`: Name-keyed feature catalogue with registration checks
//!
//! # Example
//!
//! ```rust
//! use featuregraph_core::{Feature, FeatureStore, InMemoryStore, Table, Value};
//!
//! let x = Feature::column("x");
//! let x_plus_one = Feature::builder("x_plus_one")
//!     .depends_on("x", &x)
//!     .compute(|table: &Table| {
//!         let values = table.map_column("x", |v| Value::Int(v.as_i64().unwrap_or(0) + 1))?;
//!         Ok(Table::new().with_column("x_plus_one", values)?)
//!     })
//!     .build()
//!     .unwrap();
//!
//! x_plus_one.assert_no_cyclic_dependencies().unwrap();
//! assert_eq!(x_plus_one.root_dependencies(), vec![x]);
//!
//! let input = Table::new().with_column("x", vec![Value::Int(1), Value::Int(2)]).unwrap();
//! let output = InMemoryStore::new().compute(&input, &[x_plus_one]).unwrap();
//! assert_eq!(output.value(1, "x_plus_one"), Some(&Value::Int(3)));
//! ```

mod error;
pub mod feature;
pub mod graph;
pub mod registry;
pub mod store;
pub mod table;

pub use error::{BoxError, FeatureError, FeatureResult, TableError};
pub use feature::{Dependency, Feature, FeatureBuilder, FeatureId, FeatureRef};
pub use graph::{DependencyGraph, GraphSnapshot};
pub use registry::FeatureRegistry;
pub use store::{FeatureStore, InMemoryStore, StoreConfig};
pub use table::{Table, Value};
