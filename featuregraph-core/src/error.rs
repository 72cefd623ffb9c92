//! Error Types
//!
//! A single error enum covers declaration, validation and execution
//! failures. Table-level failures have their own type and convert into
//! `FeatureError` so callers only ever match on one enum.

use thiserror::Error;

/// Boxed error returned by user-supplied compute logic.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for feature and graph operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Errors raised while declaring, validating or computing features.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeatureError {
    /// A computed feature was declared without compute logic.
    #[error("Feature '{feature}' must define compute logic")]
    MissingComputeLogic {
        /// Name of the rejected feature
        feature: String,
    },

    /// The dependency closure of a feature contains a cycle.
    #[error("Dependencies of '{feature}' do not form a DAG: {path}")]
    CyclicDependency {
        /// Root of the validated graph
        feature: String,
        /// Cycle rendered as `a -> b -> a`
        path: String,
    },

    /// Compute logic returned an error.
    #[error("Error in computing '{feature}': {source}")]
    Compute {
        /// Feature whose compute logic failed
        feature: String,
        /// Error produced by the compute logic
        #[source]
        source: BoxError,
    },

    /// A column reference names a column the input table does not have.
    #[error("Feature '{feature}' is not in input table")]
    ColumnNotFound {
        /// Referenced column
        feature: String,
    },

    /// Compute logic returned a table of the wrong shape.
    #[error("Feature '{feature}' returned an invalid table: {reason}")]
    InvalidOutput {
        /// Feature whose output was rejected
        feature: String,
        /// What was wrong with the output
        reason: String,
    },

    /// The table implementation cannot honour explicit index columns.
    #[error(
        "Feature '{feature}' declares index columns {columns:?}, but this table is positionally indexed"
    )]
    UnsupportedIndexColumns {
        /// Feature declaring the index columns
        feature: String,
        /// The declared index columns
        columns: Vec<String>,
    },

    /// A different feature is already registered under this name.
    #[error("A different feature named '{name}' is already registered")]
    DuplicateFeature {
        /// The contested name
        name: String,
    },

    /// No feature is registered under this name.
    #[error("Unknown feature: {name}")]
    UnknownFeature {
        /// The requested name
        name: String,
    },

    /// Table construction or assembly failed.
    #[error(transparent)]
    Table(#[from] TableError),
}

impl FeatureError {
    /// Creates a missing compute logic error
    pub fn missing_compute_logic(feature: impl Into<String>) -> Self {
        Self::MissingComputeLogic {
            feature: feature.into(),
        }
    }

    /// Creates a cyclic dependency error
    pub fn cyclic(feature: impl Into<String>, path: impl Into<String>) -> Self {
        Self::CyclicDependency {
            feature: feature.into(),
            path: path.into(),
        }
    }

    /// Creates a compute error wrapping the compute logic's failure
    pub fn compute(feature: impl Into<String>, source: BoxError) -> Self {
        Self::Compute {
            feature: feature.into(),
            source,
        }
    }

    /// Creates a column not found error
    pub fn column_not_found(feature: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            feature: feature.into(),
        }
    }

    /// Creates an invalid output error
    pub fn invalid_output(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            feature: feature.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported index columns error
    pub fn unsupported_index_columns(feature: impl Into<String>, columns: Vec<String>) -> Self {
        Self::UnsupportedIndexColumns {
            feature: feature.into(),
            columns,
        }
    }

    /// Creates a duplicate feature error
    pub fn duplicate_feature(name: impl Into<String>) -> Self {
        Self::DuplicateFeature { name: name.into() }
    }

    /// Creates an unknown feature error
    pub fn unknown_feature(name: impl Into<String>) -> Self {
        Self::UnknownFeature { name: name.into() }
    }
}

/// Errors raised by the in-memory table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
    /// A column's length differs from the table's row count.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        /// Offending column
        column: String,
        /// Row count of the table
        expected: usize,
        /// Row count of the column
        found: usize,
    },

    /// No column with this name exists.
    #[error("Column not found: {column}")]
    MissingColumn {
        /// Requested column
        column: String,
    },

    /// A column with this name already exists.
    #[error("Duplicate column: {column}")]
    DuplicateColumn {
        /// Offending column
        column: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_error_names_root_and_path() {
        let err = FeatureError::cyclic("a", "a -> b -> a");
        assert_eq!(
            err.to_string(),
            "Dependencies of 'a' do not form a DAG: a -> b -> a"
        );
    }

    #[test]
    fn compute_error_keeps_source() {
        use std::error::Error as _;

        let err = FeatureError::compute("ratio", "division by zero".into());
        assert!(err.to_string().contains("ratio"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("division by zero"));
    }

    #[test]
    fn table_error_converts() {
        let err: FeatureError = TableError::DuplicateColumn {
            column: "x".to_string(),
        }
        .into();
        assert!(matches!(err, FeatureError::Table(TableError::DuplicateColumn { .. })));
    }
}
