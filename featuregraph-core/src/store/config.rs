//! Store configuration.

use serde::{Deserialize, Serialize};

/// Output naming and shaping options for a feature store.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use featuregraph_core::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{ "include_input": true }"#).unwrap();
/// assert!(config.include_input);
/// assert_eq!(config.suffix_separator, "_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Placed between a feature name and the column index of a
    /// multi-column output.
    pub suffix_separator: String,

    /// Suffix single-column outputs too (`price_0` instead of `price`).
    pub always_suffix: bool,

    /// Start the result from the input columns (an augmented table)
    /// instead of returning only feature columns (a derived table).
    pub include_input: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            suffix_separator: "_".to_string(),
            always_suffix: false,
            include_input: false,
        }
    }
}

impl StoreConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the separator between a feature name and its column index.
    pub fn with_suffix_separator(mut self, separator: impl Into<String>) -> Self {
        self.suffix_separator = separator.into();
        self
    }

    /// Suffix single-column outputs too.
    pub fn with_always_suffix(mut self, always_suffix: bool) -> Self {
        self.always_suffix = always_suffix;
        self
    }

    /// Keep the input columns in the result.
    pub fn with_include_input(mut self, include_input: bool) -> Self {
        self.include_input = include_input;
        self
    }

    /// Column names for a feature output with `width` columns.
    pub fn output_names(&self, name: &str, width: usize) -> Vec<String> {
        if width == 1 && !self.always_suffix {
            return vec![name.to_string()];
        }
        (0..width)
            .map(|i| format!("{name}{}{i}", self.suffix_separator))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_output_keeps_name() {
        let config = StoreConfig::default();
        assert_eq!(config.output_names("price", 1), ["price"]);
        assert_eq!(config.output_names("price", 2), ["price_0", "price_1"]);
    }

    #[test]
    fn always_suffix_and_custom_separator() {
        let config = StoreConfig::default()
            .with_always_suffix(true)
            .with_suffix_separator(".");
        assert_eq!(config.output_names("price", 1), ["price.0"]);
    }

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(StoreConfig::from_json("{}").unwrap(), StoreConfig::default());
    }
}
