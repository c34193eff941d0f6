//! Controller lookup

use crate::controller::Controller;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Resolves controller names from `controller#action` handlers
#[cfg_attr(test, mockall::automock)]
pub trait ControllerResolver: Send + Sync {
    /// Find a controller by its (possibly namespaced) name
    fn resolve(&self, name: &str) -> Option<Arc<dyn Controller>>;
}

/// Map-backed controller registry
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: BTreeMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under `name` (`post`, `provider/file`)
    pub fn register<C: Controller + 'static>(
        &mut self,
        name: impl Into<String>,
        controller: C,
    ) -> &mut Self {
        self.insert(name, Arc::new(controller))
    }

    /// Register a shared controller
    pub fn insert(&mut self, name: impl Into<String>, controller: Arc<dyn Controller>) -> &mut Self {
        let name = name.into();
        tracing::debug!(controller = %name, "Controller registered");
        self.controllers.insert(name, controller);
        self
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Number of registered controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl ControllerResolver for ControllerRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}
