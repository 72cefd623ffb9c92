//! Feature Descriptors
//!
//! A feature is an immutable, cheaply clonable handle describing one
//! computation over a table: its name and metadata, the index columns it
//! produces, the features it depends on and the compute logic itself.
//!
//! # Dependencies
//!
//! Dependencies are keyed. The key is the column name under which the
//! dependency's output is exposed to this feature's compute logic, so a
//! feature reading `table["x"]` declares `depends_on("x", ...)`. Raw input
//! columns are degenerate features built with [`Feature::column`]: they
//! carry no compute logic and executors read them straight from the input.
//!
//! # Identity
//!
//! Every feature receives a [`FeatureId`] when it is built. Equality and
//! hashing use that identity, never the name.
//!
//! # Cyclic declarations
//!
//! Because a feature can only depend on features that already exist, plain
//! construction can never produce a cycle. [`Feature::cyclic`] hands out a
//! [`FeatureRef`] to the feature under construction, which can then appear
//! among its own dependencies or among the dependencies of features built
//! inside the closure. Forward links are weak, so cyclic declarations do
//! not leak.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{error, warn};

use super::FeatureId;
use crate::error::{BoxError, FeatureError, FeatureResult};
use crate::graph::DependencyGraph;

type ComputeLogic<T> = Arc<dyn Fn(&T) -> Result<T, BoxError> + Send + Sync>;

/// Compute logic plus the type name of the callable, kept for display.
struct ComputeFn<T> {
    label: &'static str,
    logic: ComputeLogic<T>,
}

enum FeatureKind<T> {
    /// Reads an input column by name; nothing to compute.
    Column,
    Computed(ComputeFn<T>),
}

struct FeatureInner<T> {
    id: FeatureId,
    name: String,
    description: Option<String>,
    version: Option<String>,
    index_columns: SmallVec<[String; 2]>,
    dependencies: IndexMap<String, Dependency<T>>,
    kind: FeatureKind<T>,
}

impl<T> FeatureInner<T> {
    /// Stand-in returned from a rejected cyclic declaration; dropped at once.
    fn rejected() -> Self {
        Self {
            id: FeatureId::next(),
            name: String::new(),
            description: None,
            version: None,
            index_columns: SmallVec::new(),
            dependencies: IndexMap::new(),
            kind: FeatureKind::Column,
        }
    }
}

/// A declared, immutable feature over tables of type `T`.
pub struct Feature<T>(Arc<FeatureInner<T>>);

/// Weak handle to a feature that may still be under construction.
pub struct FeatureRef<T>(Weak<FeatureInner<T>>);

/// One entry of a feature's dependency map.
pub enum Dependency<T> {
    /// A fully constructed feature.
    Feature(Feature<T>),
    /// A forward reference handed out by [`Feature::cyclic`].
    Forward(FeatureRef<T>),
}

impl<T> Dependency<T> {
    fn resolve(&self) -> Option<Feature<T>> {
        match self {
            Dependency::Feature(feature) => Some(feature.clone()),
            Dependency::Forward(forward) => forward.0.upgrade().map(Feature),
        }
    }
}

impl<T> Feature<T> {
    /// Start declaring a computed feature.
    pub fn builder(name: impl Into<String>) -> FeatureBuilder<T> {
        FeatureBuilder::new(name)
    }

    /// Declare a computed feature with no dependencies or metadata.
    pub fn new<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&T) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(FeatureInner {
            id: FeatureId::next(),
            name: name.into(),
            description: None,
            version: None,
            index_columns: SmallVec::new(),
            dependencies: IndexMap::new(),
            kind: FeatureKind::Computed(ComputeFn::new(compute)),
        }))
    }

    /// Reference to an input column that is already present under `name`.
    pub fn column(name: impl Into<String>) -> Self {
        Self(Arc::new(FeatureInner {
            id: FeatureId::next(),
            name: name.into(),
            description: Some("Identifies a given column by name.".to_string()),
            version: Some("1.0.0".to_string()),
            index_columns: SmallVec::new(),
            dependencies: IndexMap::new(),
            kind: FeatureKind::Column,
        }))
    }

    /// Declare a feature that may (transitively) depend on itself.
    ///
    /// `declare` receives a forward reference to the feature being built
    /// and returns its builder. Any error returned by `declare`, or raised
    /// while building, is propagated and no feature is created.
    ///
    /// ```
    /// use featuregraph_core::Feature;
    ///
    /// let looping = Feature::<Vec<i64>>::cyclic(|this| {
    ///     Ok(Feature::builder("looping")
    ///         .depends_on("itself", this)
    ///         .compute(|t: &Vec<i64>| Ok(t.clone())))
    /// })
    /// .unwrap();
    /// assert!(looping.assert_no_cyclic_dependencies().is_err());
    /// ```
    pub fn cyclic<F>(declare: F) -> FeatureResult<Self>
    where
        F: FnOnce(&FeatureRef<T>) -> FeatureResult<FeatureBuilder<T>>,
    {
        let mut failure = None;
        let inner = Arc::new_cyclic(|weak| {
            let this = FeatureRef(weak.clone());
            match declare(&this).and_then(FeatureBuilder::into_inner) {
                Ok(inner) => inner,
                Err(err) => {
                    failure = Some(err);
                    FeatureInner::rejected()
                }
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(Self(inner)),
        }
    }

    /// The feature's identity.
    pub fn id(&self) -> FeatureId {
        self.0.id
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The free-text description, if one was given.
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// The declared version, if any.
    pub fn version(&self) -> Option<&str> {
        self.0.version.as_deref()
    }

    /// Columns the feature's output is indexed by, in declaration order.
    pub fn index_columns(&self) -> &[String] {
        &self.0.index_columns
    }

    /// True for column references created with [`Feature::column`].
    pub fn is_column(&self) -> bool {
        matches!(self.0.kind, FeatureKind::Column)
    }

    /// True for features carrying compute logic.
    pub fn is_computed(&self) -> bool {
        !self.is_column()
    }

    /// By-name equivalence: both are column references to the same column.
    pub fn is_same_column(&self, other: &Feature<T>) -> bool {
        self.is_column() && other.is_column() && self.name() == other.name()
    }

    /// Iterate over `(key, dependency)` pairs in declaration order.
    ///
    /// Forward references whose target no longer exists are skipped.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, Feature<T>)> + '_ {
        self.0.dependencies.iter().filter_map(|(key, dependency)| {
            let resolved = dependency.resolve();
            if resolved.is_none() {
                warn!(
                    feature = %self.name(),
                    key = %key,
                    "Skipping dangling forward dependency"
                );
            }
            resolved.map(|feature| (key.as_str(), feature))
        })
    }

    /// Look up a dependency by key.
    pub fn dependency(&self, key: &str) -> Option<Feature<T>> {
        self.0.dependencies.get(key).and_then(Dependency::resolve)
    }

    /// True when the feature declares no dependencies.
    pub fn has_dependencies(&self) -> bool {
        !self.0.dependencies.is_empty()
    }

    /// Run the compute logic against a table holding every dependency.
    ///
    /// Column references have nothing to compute and return `Ok(None)`;
    /// executors read the named column from the input instead.
    pub fn compute(&self, input: &T) -> FeatureResult<Option<T>> {
        match &self.0.kind {
            FeatureKind::Column => Ok(None),
            FeatureKind::Computed(compute) => (compute.logic)(input).map(Some).map_err(|source| {
                error!(feature = %self.name(), error = %source, "Error in computing feature");
                FeatureError::compute(self.name(), source)
            }),
        }
    }

    /// A weak handle to this feature.
    pub fn downgrade(&self) -> FeatureRef<T> {
        FeatureRef(Arc::downgrade(&self.0))
    }

    /// Build this feature's dependency graph.
    pub fn dependency_graph(&self) -> DependencyGraph<T> {
        DependencyGraph::build(self)
    }

    /// Fail with [`FeatureError::CyclicDependency`] if the dependencies
    /// do not form a DAG.
    pub fn assert_no_cyclic_dependencies(&self) -> FeatureResult<()> {
        self.dependency_graph().assert_acyclic()
    }

    /// Leaves of the dependency graph.
    pub fn root_dependencies(&self) -> Vec<Feature<T>> {
        self.dependency_graph().root_dependencies()
    }

    fn compute_label(&self) -> &'static str {
        match &self.0.kind {
            FeatureKind::Column => "column lookup",
            FeatureKind::Computed(compute) => compute.label,
        }
    }
}

impl<T> Clone for Feature<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Feature<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl<T> Eq for Feature<T> {}

impl<T> Hash for Feature<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl<T> fmt::Display for Feature<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Feature(name={}, compute=", self.name())?;
        match &self.0.kind {
            FeatureKind::Column => write!(f, "<{}>", self.compute_label())?,
            FeatureKind::Computed(_) => write!(f, "<fn {}>", self.compute_label())?,
        }
        write!(f, ", version={}", self.version().unwrap_or("None"))?;

        write!(f, ", index_columns=[")?;
        for (i, column) in self.index_columns().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{column}'")?;
        }

        write!(f, "], dependencies={{")?;
        for (i, (key, dependency)) in self.dependencies().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{key}': 'Feature({})'", dependency.name())?;
        }
        write!(f, "}})")
    }
}

impl<T> fmt::Debug for Feature<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies: Vec<(&str, String)> = self
            .dependencies()
            .map(|(key, dependency)| (key, dependency.name().to_string()))
            .collect();

        f.debug_struct("Feature")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("compute", &self.compute_label())
            .field("version", &self.version())
            .field("index_columns", &self.index_columns())
            .field("dependencies", &dependencies)
            .finish()
    }
}

impl<T> Clone for FeatureRef<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T> fmt::Debug for FeatureRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FeatureRef(..)")
    }
}

impl<T> From<Feature<T>> for Dependency<T> {
    fn from(feature: Feature<T>) -> Self {
        Dependency::Feature(feature)
    }
}

impl<T> From<&Feature<T>> for Dependency<T> {
    fn from(feature: &Feature<T>) -> Self {
        Dependency::Feature(feature.clone())
    }
}

impl<T> From<FeatureRef<T>> for Dependency<T> {
    fn from(forward: FeatureRef<T>) -> Self {
        Dependency::Forward(forward)
    }
}

impl<T> From<&FeatureRef<T>> for Dependency<T> {
    fn from(forward: &FeatureRef<T>) -> Self {
        Dependency::Forward(forward.clone())
    }
}

impl<T> ComputeFn<T> {
    fn new<F>(compute: F) -> Self
    where
        F: Fn(&T) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            label: std::any::type_name::<F>(),
            logic: Arc::new(compute),
        }
    }
}

/// Builder for computed features.
///
/// `build` rejects a declaration without compute logic, so an invalid
/// feature never reaches a graph.
pub struct FeatureBuilder<T> {
    name: String,
    description: Option<String>,
    version: Option<String>,
    index_columns: SmallVec<[String; 2]>,
    dependencies: IndexMap<String, Dependency<T>>,
    compute: Option<ComputeFn<T>>,
}

impl<T> FeatureBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            index_columns: SmallVec::new(),
            dependencies: IndexMap::new(),
            compute: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the version string.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Append one index column.
    pub fn index_column(mut self, column: impl Into<String>) -> Self {
        self.index_columns.push(column.into());
        self
    }

    /// Append several index columns, keeping their order.
    pub fn index_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Expose `dependency`'s output to this feature under `key`.
    ///
    /// Declaring the same key again replaces the earlier dependency.
    pub fn depends_on(mut self, key: impl Into<String>, dependency: impl Into<Dependency<T>>) -> Self {
        self.dependencies.insert(key.into(), dependency.into());
        self
    }

    /// Depend on an input column, exposed under its own name.
    pub fn depends_on_column(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let column = Feature::column(name.clone());
        self.depends_on(name, column)
    }

    /// Set the compute logic.
    pub fn compute<F>(mut self, compute: F) -> Self
    where
        F: Fn(&T) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.compute = Some(ComputeFn::new(compute));
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> FeatureResult<Feature<T>> {
        self.into_inner().map(|inner| Feature(Arc::new(inner)))
    }

    fn into_inner(self) -> FeatureResult<FeatureInner<T>> {
        let Some(compute) = self.compute else {
            let err = FeatureError::missing_compute_logic(&self.name);
            error!(feature = %self.name, error = %err, "Error in Feature definition");
            return Err(err);
        };

        Ok(FeatureInner {
            id: FeatureId::next(),
            name: self.name,
            description: self.description,
            version: self.version,
            index_columns: self.index_columns,
            dependencies: self.dependencies,
            kind: FeatureKind::Computed(compute),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Rows = Vec<i64>;

    fn add_one(rows: &Rows) -> Result<Rows, BoxError> {
        Ok(rows.iter().map(|v| v + 1).collect())
    }

    #[test]
    fn builder_without_compute_is_rejected() {
        let result = Feature::<Rows>::builder("incomplete")
            .depends_on_column("x")
            .build();

        assert!(matches!(
            result,
            Err(FeatureError::MissingComputeLogic { ref feature }) if feature == "incomplete"
        ));
    }

    #[test]
    fn weak_handle_resolves_while_target_lives() {
        let x = Feature::<Rows>::column("x");
        let f = Feature::builder("f")
            .depends_on("x", x.downgrade())
            .compute(add_one)
            .build()
            .unwrap();

        assert_eq!(f.dependency("x"), Some(x.clone()));
        assert_eq!(f.dependencies().count(), 1);

        drop(x);
        assert!(f.dependency("x").is_none());
        assert_eq!(f.dependencies().count(), 0);
    }

    #[test]
    fn builder_keeps_metadata() {
        let feature = Feature::<Rows>::builder("add_one")
            .description("Adds one")
            .version("2.1")
            .index_columns(["user_id", "day"])
            .depends_on_column("x")
            .compute(add_one)
            .build()
            .unwrap();

        assert_eq!(feature.name(), "add_one");
        assert_eq!(feature.description(), Some("Adds one"));
        assert_eq!(feature.version(), Some("2.1"));
        assert_eq!(feature.index_columns(), ["user_id", "day"]);
        assert!(feature.is_computed());
        assert_eq!(feature.dependency("x").map(|d| d.name().to_string()).as_deref(), Some("x"));
    }

    #[test]
    fn column_reference_defaults() {
        let price = Feature::<Rows>::column("price");

        assert!(price.is_column());
        assert_eq!(price.description(), Some("Identifies a given column by name."));
        assert_eq!(price.version(), Some("1.0.0"));
        assert!(!price.has_dependencies());
        assert!(price.compute(&vec![1, 2]).unwrap().is_none());
    }

    #[test]
    fn identity_is_not_the_name() {
        let a = Feature::<Rows>::new("same", add_one);
        let b = Feature::<Rows>::new("same", add_one);

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn same_column_compares_by_name() {
        let x1 = Feature::<Rows>::column("x");
        let x2 = Feature::<Rows>::column("x");
        let y = Feature::<Rows>::column("y");
        let computed = Feature::<Rows>::new("x", add_one);

        assert!(x1.is_same_column(&x2));
        assert!(!x1.is_same_column(&y));
        assert!(!x1.is_same_column(&computed));
        assert_ne!(x1, x2);
    }

    #[test]
    fn compute_runs_logic() {
        let feature = Feature::<Rows>::new("add_one", add_one);
        assert_eq!(feature.compute(&vec![1, 2]).unwrap(), Some(vec![2, 3]));
    }

    #[test]
    fn compute_wraps_errors_with_feature_name() {
        let feature = Feature::<Rows>::new("broken", |_: &Rows| Err("boom".into()));

        let err = feature.compute(&vec![1]).unwrap_err();
        assert!(matches!(err, FeatureError::Compute { ref feature, .. } if feature == "broken"));
    }

    #[test]
    fn repeated_key_keeps_last_dependency() {
        let a = Feature::<Rows>::column("a");
        let b = Feature::<Rows>::column("b");
        let feature = Feature::builder("f")
            .depends_on("input", &a)
            .depends_on("input", &b)
            .compute(add_one)
            .build()
            .unwrap();

        let deps: Vec<_> = feature.dependencies().collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].1, b);
    }

    #[test]
    fn display_shows_dependency_names_only() {
        let x = Feature::<Rows>::column("x");
        let feature = Feature::builder("add_1_to_x")
            .depends_on("x", &x)
            .compute(add_one)
            .build()
            .unwrap();

        let rendered = feature.to_string();
        assert!(rendered.starts_with("Feature(name=add_1_to_x, compute=<fn "));
        assert!(rendered.contains("add_one"));
        assert!(rendered.ends_with(
            "version=None, index_columns=[], dependencies={'x': 'Feature(x)'})"
        ));
        assert_eq!(
            x.to_string(),
            "Feature(name=x, compute=<column lookup>, version=1.0.0, index_columns=[], dependencies={})"
        );
    }

    #[test]
    fn cyclic_declares_self_dependency() {
        let looping = Feature::<Rows>::cyclic(|this| {
            Ok(Feature::builder("looping").depends_on("me", this).compute(add_one))
        })
        .unwrap();

        let deps: Vec<_> = looping.dependencies().collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].1, looping);
    }

    #[test]
    fn cyclic_propagates_missing_compute() {
        let result = Feature::<Rows>::cyclic(|this| Ok(Feature::builder("bad").depends_on("me", this)));
        assert!(matches!(result, Err(FeatureError::MissingComputeLogic { .. })));
    }

    #[test]
    fn cyclic_propagates_inner_errors() {
        let result = Feature::<Rows>::cyclic(|this| {
            let inner = Feature::builder("inner").depends_on("outer", this).build()?;
            Ok(Feature::builder("outer").depends_on("inner", inner).compute(add_one))
        });
        assert!(matches!(
            result,
            Err(FeatureError::MissingComputeLogic { ref feature }) if feature == "inner"
        ));
    }

    #[test]
    fn dangling_forward_reference_is_skipped() {
        let mut escaped = None;
        let inner = {
            let outer = Feature::<Rows>::cyclic(|this| {
                let inner = Feature::builder("inner")
                    .depends_on("outer", this)
                    .compute(add_one)
                    .build()?;
                escaped = Some(inner.clone());
                Ok(Feature::builder("outer").depends_on("inner", inner).compute(add_one))
            })
            .unwrap();
            assert_eq!(escaped.as_ref().map(|f| f.dependencies().count()), Some(1));
            drop(outer);
            escaped.take().unwrap()
        };

        assert_eq!(inner.dependencies().count(), 0);
        assert!(inner.dependency("outer").is_none());
    }
}
