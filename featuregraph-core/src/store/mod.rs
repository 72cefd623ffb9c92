//! Feature Stores
//!
//! A feature store executes features against a concrete table type. The
//! graph engine decides what has to run and in which order; the store
//! decides how a table is augmented with dependency columns and how
//! outputs are merged.
//!
//! # Contract
//!
//! Given an input table and a list of features, a store must:
//!
//! 1. Compute every feature in the dependency closure, dependencies first.
//! 2. Read column references straight from the input instead of calling
//!    their (empty) compute logic.
//! 3. Reject compute results that are not table-shaped, and index column
//!    declarations the table type cannot honour.
//! 4. Merge the requested features' outputs into one table.

mod config;
mod memory;

pub use config::StoreConfig;
pub use memory::InMemoryStore;

use crate::error::FeatureResult;
use crate::feature::Feature;

/// Executes features against tables of type `Self::Table`.
pub trait FeatureStore {
    /// The table type features of this store read and produce.
    type Table;

    /// Compute `features` over `input` and return their merged outputs.
    fn compute(&self, input: &Self::Table, features: &[Feature<Self::Table>]) -> FeatureResult<Self::Table>;
}
