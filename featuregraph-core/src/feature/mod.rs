//! Features
//!
//! A feature is a named, versioned computation over a table together with
//! the features it depends on. Features are declared once and shared as
//! cheap `Arc` handles; they never change after construction.
//!
//! # Example
//!
//! ```rust
//! use featuregraph_core::{Feature, Table, Value};
//!
//! let doubled = Feature::builder("doubled")
//!     .depends_on_column("x")
//!     .compute(|table: &Table| {
//!         let values = table.map_column("x", |v| Value::Int(v.as_i64().unwrap_or(0) * 2))?;
//!         Ok(Table::new().with_column("doubled", values)?)
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doubled.root_dependencies().len(), 1);
//! ```

mod descriptor;
mod id;

pub use descriptor::{Dependency, Feature, FeatureBuilder, FeatureRef};
pub use id::FeatureId;
