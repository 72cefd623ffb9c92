//! In-Memory Tables
//!
//! A minimal column-oriented table used by [`InMemoryStore`]. Rows are
//! identified by position only, so the table has no notion of explicit
//! index columns.
//!
//! Columns keep their insertion order and always have the same length.
//! The first column added to an empty table fixes the row count.
//!
//! [`InMemoryStore`]: crate::store::InMemoryStore

mod value;

pub use value::Value;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TableError;

/// Ordered, equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: IndexMap<String, Vec<Value>>,
    rows: usize,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Builder-style [`Table::push_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<Self, TableError> {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Append a new column. Fails if the name is taken or the length is wrong.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<(), TableError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(TableError::DuplicateColumn { column: name });
        }
        self.check_length(&name, &values)?;
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Insert a column, replacing any column with the same name in place.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<(), TableError> {
        let name = name.into();
        let replacing_only_column = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !replacing_only_column {
            self.check_length(&name, &values)?;
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    fn check_length(&self, name: &str, values: &[Value]) -> Result<(), TableError> {
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                found: values.len(),
            });
        }
        Ok(())
    }

    /// Get a column's values.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Like [`Table::column`], but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<&[Value], TableError> {
        self.column(name).ok_or_else(|| TableError::MissingColumn {
            column: name.to_string(),
        })
    }

    /// Apply `f` to every value of a column.
    pub fn map_column<F>(&self, name: &str, f: F) -> Result<Vec<Value>, TableError>
    where
        F: FnMut(&Value) -> Value,
    {
        Ok(self.require_column(name)?.iter().map(f).collect())
    }

    /// The value at `row` in `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.column(column).and_then(|values| values.get(row))
    }

    /// True if a column named `name` exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// `(name, values)` pairs in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Consume the table, yielding its columns in order.
    pub fn into_columns(self) -> impl Iterator<Item = (String, Vec<Value>)> {
        self.columns.into_iter()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn first_column_fixes_row_count() {
        let table = Table::new().with_column("a", ints(&[1, 2, 3])).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 1);

        let result = table.with_column("b", ints(&[1]));
        assert!(matches!(
            result,
            Err(TableError::LengthMismatch { expected: 3, found: 1, .. })
        ));
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut table = Table::from_columns([("a", ints(&[1]))]).unwrap();
        let result = table.push_column("a", ints(&[2]));
        assert!(matches!(result, Err(TableError::DuplicateColumn { .. })));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut table = Table::from_columns([("a", ints(&[1, 2])), ("b", ints(&[3, 4]))]).unwrap();
        table.set_column("a", ints(&[5, 6])).unwrap();

        assert_eq!(table.column_names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(table.column("a"), Some(ints(&[5, 6]).as_slice()));
        assert!(table.set_column("c", ints(&[1])).is_err());
    }

    #[test]
    fn map_column_requires_column() {
        let table = Table::from_columns([("a", ints(&[1, 2]))]).unwrap();
        let doubled = table
            .map_column("a", |v| Value::Int(v.as_i64().unwrap_or(0) * 2))
            .unwrap();
        assert_eq!(doubled, ints(&[2, 4]));

        assert!(matches!(
            table.map_column("missing", |v| v.clone()),
            Err(TableError::MissingColumn { .. })
        ));
    }

    #[test]
    fn value_lookup() {
        let table = Table::from_columns([("a", ints(&[7, 8]))]).unwrap();
        assert_eq!(table.value(1, "a"), Some(&Value::Int(8)));
        assert_eq!(table.value(2, "a"), None);
        assert_eq!(table.value(0, "b"), None);
    }
}
