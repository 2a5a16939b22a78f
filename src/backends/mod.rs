//! Backend implementations and the process-wide catalog.

pub mod null;
pub mod skia_cpu;

use std::collections::BTreeMap;

use crate::backend::Backend;

pub use null::NullBackend;
pub use skia_cpu::SkiaCpuBackend;

type BackendFactory = Box<dyn Fn() -> Box<dyn Backend>>;

/// Registered backends indexed by stable id.
///
/// Built once during startup, before the harness runs, and treated as
/// immutable afterwards. Registration is intentionally not thread-safe.
#[derive(Default)]
pub struct BackendCatalog {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with every linked-in backend.
    pub fn with_builtin_backends() -> Self {
        let mut catalog = Self::new();
        catalog.register("null", || Box::new(NullBackend::new()));
        catalog.register("tiny_skia", || Box::new(SkiaCpuBackend::new()));
        catalog
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn() -> Box<dyn Backend> + 'static,
    ) {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Registered ids, sorted lexicographically.
    pub fn ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Create a fresh backend instance, or `None` for an unknown id.
    pub fn create(&self, id: &str) -> Option<Box<dyn Backend>> {
        self.factories.get(id).map(|factory| factory())
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
