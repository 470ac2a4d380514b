//! Module registry for constructing stages from type-name strings.
//!
//! The registry keeps one name-to-constructor map per stage family, the way
//! each family of the pipeline owns its own chain position. It is an
//! explicit object, created at startup and passed to whatever needs to
//! build stages from names (chiefly [`Pipeline::load`](crate::Pipeline::load)),
//! never ambient global state. Concrete stage crates expose registration
//! functions that populate it exactly once per type before first use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::module::{Classifier, FeatureExtractor, PostProcessor, PreProcessor, Regressor};

/// Zero-argument constructor returning a default-initialized stage.
pub type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

struct FamilyTable<T: ?Sized> {
    constructors: RwLock<HashMap<String, Constructor<T>>>,
}

impl<T: ?Sized> FamilyTable<T> {
    fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .unwrap()
            .insert(name.into(), Arc::new(constructor));
    }

    fn create(&self, name: &str) -> Option<Box<T>> {
        let constructors = self.constructors.read().unwrap();
        constructors.get(name).map(|constructor| constructor())
    }

    fn contains(&self, name: &str) -> bool {
        self.constructors.read().unwrap().contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

struct RegistryInner {
    pre_processors: FamilyTable<dyn PreProcessor>,
    feature_extractors: FamilyTable<dyn FeatureExtractor>,
    classifiers: FamilyTable<dyn Classifier>,
    regressors: FamilyTable<dyn Regressor>,
    post_processors: FamilyTable<dyn PostProcessor>,
}

/// Registry of stage constructors, one table per family.
///
/// Cloning is shallow: clones share the same tables, so a registry can be
/// handed to several components after being populated once.
///
/// # Example
/// ```
/// use kinema_core::ModuleRegistry;
///
/// let registry = ModuleRegistry::new();
/// assert!(registry.create_feature_extractor("TimeseriesWindow").is_none());
/// ```
pub struct ModuleRegistry {
    inner: Arc<RegistryInner>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                pre_processors: FamilyTable::new(),
                feature_extractors: FamilyTable::new(),
                classifiers: FamilyTable::new(),
                regressors: FamilyTable::new(),
                post_processors: FamilyTable::new(),
            }),
        }
    }

    pub fn register_pre_processor<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn PreProcessor> + Send + Sync + 'static,
    {
        self.inner.pre_processors.register(name, constructor);
    }

    pub fn register_feature_extractor<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn FeatureExtractor> + Send + Sync + 'static,
    {
        self.inner.feature_extractors.register(name, constructor);
    }

    pub fn register_classifier<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Classifier> + Send + Sync + 'static,
    {
        self.inner.classifiers.register(name, constructor);
    }

    pub fn register_regressor<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Regressor> + Send + Sync + 'static,
    {
        self.inner.regressors.register(name, constructor);
    }

    pub fn register_post_processor<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn PostProcessor> + Send + Sync + 'static,
    {
        self.inner.post_processors.register(name, constructor);
    }

    /// Constructs a registered pre-processor, or `None` if the name is
    /// unregistered.
    pub fn create_pre_processor(&self, name: &str) -> Option<Box<dyn PreProcessor>> {
        self.inner.pre_processors.create(name)
    }

    pub fn create_feature_extractor(&self, name: &str) -> Option<Box<dyn FeatureExtractor>> {
        self.inner.feature_extractors.create(name)
    }

    pub fn create_classifier(&self, name: &str) -> Option<Box<dyn Classifier>> {
        self.inner.classifiers.create(name)
    }

    pub fn create_regressor(&self, name: &str) -> Option<Box<dyn Regressor>> {
        self.inner.regressors.create(name)
    }

    pub fn create_post_processor(&self, name: &str) -> Option<Box<dyn PostProcessor>> {
        self.inner.post_processors.create(name)
    }

    pub fn has_pre_processor(&self, name: &str) -> bool {
        self.inner.pre_processors.contains(name)
    }

    pub fn has_feature_extractor(&self, name: &str) -> bool {
        self.inner.feature_extractors.contains(name)
    }

    pub fn has_classifier(&self, name: &str) -> bool {
        self.inner.classifiers.contains(name)
    }

    pub fn has_regressor(&self, name: &str) -> bool {
        self.inner.regressors.contains(name)
    }

    pub fn has_post_processor(&self, name: &str) -> bool {
        self.inner.post_processors.contains(name)
    }

    /// Registered type names per family, sorted.
    pub fn pre_processor_types(&self) -> Vec<String> {
        self.inner.pre_processors.names()
    }

    pub fn feature_extractor_types(&self) -> Vec<String> {
        self.inner.feature_extractors.names()
    }

    pub fn classifier_types(&self) -> Vec<String> {
        self.inner.classifiers.names()
    }

    pub fn regressor_types(&self) -> Vec<String> {
        self.inner.regressors.names()
    }

    pub fn post_processor_types(&self) -> Vec<String> {
        self.inner.post_processors.names()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ModuleRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
