//! In-Memory Feature Store
//!
//! Executes features over [`Table`]. Tables are positionally indexed, so
//! features declaring index columns are rejected.
//!
//! # How a feature sees its inputs
//!
//! Each computed feature receives a copy of the input table augmented with
//! the outputs of its dependencies, exposed under their dependency keys.
//! A dependency with a single output column appears as `key`; one with
//! several columns appears as `key_0`, `key_1`, ... (using the configured
//! separator).
//!
//! Outputs computed during one call are kept only for that call.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use super::{FeatureStore, StoreConfig};
use crate::error::{FeatureError, FeatureResult, TableError};
use crate::feature::{Feature, FeatureId};
use crate::graph;
use crate::table::Table;

/// Feature store backed by [`Table`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    config: StoreConfig,
}

impl InMemoryStore {
    /// Create a store with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Get the store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn compute_feature(
        &self,
        input: &Table,
        feature: &Feature<Table>,
        outputs: &HashMap<FeatureId, Table>,
    ) -> FeatureResult<Table> {
        if !feature.index_columns().is_empty() {
            return Err(failed(
                feature,
                FeatureError::unsupported_index_columns(feature.name(), feature.index_columns().to_vec()),
            ));
        }

        let output = if feature.is_column() {
            debug!(feature = %feature.name(), "Reading column");
            let values = input
                .column(feature.name())
                .ok_or_else(|| failed(feature, FeatureError::column_not_found(feature.name())))?;
            Table::new().with_column(feature.name(), values.to_vec())?
        } else {
            debug!(feature = %feature.name(), "Computing feature");
            let view = self.dependency_view(input, feature, outputs)?;
            let output = feature
                .compute(&view)?
                .ok_or_else(|| failed(feature, FeatureError::invalid_output(feature.name(), "no table returned")))?;
            check_shape(feature, &output, input.num_rows())?;
            output
        };

        let names = self.config.output_names(feature.name(), output.num_columns());
        let values = output.into_columns().map(|(_, values)| values);
        Ok(Table::from_columns(names.into_iter().zip(values))?)
    }

    /// The input table plus every dependency output under its key.
    ///
    /// Dependency columns may replace input columns of the same name, but
    /// two dependencies may not expose the same name.
    fn dependency_view(
        &self,
        input: &Table,
        feature: &Feature<Table>,
        outputs: &HashMap<FeatureId, Table>,
    ) -> FeatureResult<Table> {
        let mut view = input.clone();
        let mut exposed = HashSet::new();

        for (key, dependency) in feature.dependencies() {
            let output = outputs
                .get(&dependency.id())
                .ok_or_else(|| failed(feature, FeatureError::column_not_found(dependency.name())))?;

            let names = if output.num_columns() == 1 {
                vec![key.to_string()]
            } else {
                self.config.output_names(key, output.num_columns())
            };
            for (name, (_, values)) in names.into_iter().zip(output.columns()) {
                if !exposed.insert(name.clone()) {
                    return Err(failed(feature, TableError::DuplicateColumn { column: name }.into()));
                }
                view.set_column(name, values.to_vec())
                    .map_err(|err| failed(feature, err.into()))?;
            }
        }

        Ok(view)
    }
}

impl FeatureStore for InMemoryStore {
    type Table = Table;

    fn compute(&self, input: &Table, features: &[Feature<Table>]) -> FeatureResult<Table> {
        let order = graph::plan(features)?;

        let mut outputs = HashMap::with_capacity(order.len());
        for feature in &order {
            let output = self.compute_feature(input, feature, &outputs)?;
            outputs.insert(feature.id(), output);
        }

        let mut result = if self.config.include_input {
            input.clone()
        } else {
            Table::new()
        };

        let mut merged = HashSet::new();
        for feature in features {
            if !merged.insert(feature.id()) {
                continue;
            }
            // Already part of the input
            if self.config.include_input && feature.is_column() {
                continue;
            }
            let Some(output) = outputs.get(&feature.id()) else {
                continue;
            };
            for (name, values) in output.columns() {
                result
                    .push_column(name, values.to_vec())
                    .map_err(|err| failed(feature, err.into()))?;
            }
        }

        debug!(
            requested = features.len(),
            computed = order.len(),
            columns = result.num_columns(),
            "Computed features"
        );
        Ok(result)
    }
}

/// Compute results must have columns and match the input's row count.
fn check_shape(feature: &Feature<Table>, output: &Table, rows: usize) -> FeatureResult<()> {
    if output.is_empty() {
        return Err(failed(
            feature,
            FeatureError::invalid_output(feature.name(), "no columns returned"),
        ));
    }
    if output.num_rows() != rows {
        return Err(failed(
            feature,
            FeatureError::invalid_output(
                feature.name(),
                format!("{} rows returned, expected {}", output.num_rows(), rows),
            ),
        ));
    }
    Ok(())
}

fn failed(feature: &Feature<Table>, err: FeatureError) -> FeatureError {
    error!(feature = %feature.name(), error = %err, "Error in computing feature");
    err
}
