//! Feature Registry
//!
//! A name-keyed catalogue of features. Registration is where a feature is
//! validated: its dependency graph must be acyclic and its name must not
//! already belong to a different feature. Invalid features never enter the
//! registry.
//!
//! # Thread Safety
//!
//! The registry is shared behind a read-write lock. Features themselves are
//! immutable, so lookups hand out clones of the handles and release the
//! lock immediately.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::{FeatureError, FeatureResult};
use crate::feature::Feature;
use crate::graph;

/// Registered features, in registration order.
pub struct FeatureRegistry<T> {
    features: RwLock<IndexMap<String, Feature<T>>>,
}

impl<T> FeatureRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            features: RwLock::new(IndexMap::new()),
        }
    }

    /// Validate and register a feature.
    ///
    /// Registering the same feature twice is a no-op.
    pub fn register(&self, feature: Feature<T>) -> FeatureResult<()> {
        graph::assert_acyclic(&feature)?;

        let mut features = self.features.write();
        if let Some(existing) = features.get(feature.name()) {
            if *existing == feature {
                return Ok(());
            }
            let err = FeatureError::duplicate_feature(feature.name());
            error!(feature = %feature.name(), error = %err, "Error registering feature");
            return Err(err);
        }

        debug!(feature = %feature.name(), id = %feature.id(), "Registered feature");
        features.insert(feature.name().to_string(), feature);
        Ok(())
    }

    /// Get the feature registered under `name`.
    pub fn get(&self, name: &str) -> Option<Feature<T>> {
        self.features.read().get(name).cloned()
    }

    /// True if a feature is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.features.read().contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.features.read().keys().cloned().collect()
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.features.read().len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.features.read().is_empty()
    }

    /// Look up several features by name, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> FeatureResult<Vec<Feature<T>>> {
        let features = self.features.read();
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                features.get(name).cloned().ok_or_else(|| {
                    let err = FeatureError::unknown_feature(name);
                    error!(feature = %name, error = %err, "Error resolving feature");
                    err
                })
            })
            .collect()
    }

    /// Every feature needed to compute the named features, dependencies
    /// first.
    pub fn plan<S: AsRef<str>>(&self, names: &[S]) -> FeatureResult<Vec<Feature<T>>> {
        graph::plan(&self.resolve(names)?)
    }
}

impl<T> Default for FeatureRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
