//! Named middleware registry
//!
//! Routes and controllers may refer to middleware by name, optionally with
//! an argument: `"auth"` or `"auth:editor"`. The registry turns those
//! references into instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use trellis_core::{Error, Middleware, MiddlewareRef, Result};

/// Builds a middleware from the optional argument of a reference
pub type MiddlewareFactory =
    Arc<dyn Fn(Option<&str>) -> Result<Arc<dyn Middleware>> + Send + Sync>;

/// Registry of named middleware factories
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: BTreeMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in middleware.
    ///
    /// - `request_id`: [`RequestId`](crate::RequestId), argument overrides the header name
    /// - `logger`: [`RequestLogger`](crate::RequestLogger), argument sets the level
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("request_id", |arg| {
            let mut config = crate::RequestIdConfig::default();
            if let Some(header) = arg {
                config.header_name = header.to_string();
            }
            Ok(Arc::new(crate::RequestId::with_config(config)) as Arc<dyn Middleware>)
        });
        registry.register("logger", |arg| {
            let mut config = crate::LoggingConfig::default();
            if let Some(level) = arg {
                config.log_level = level.parse().map_err(|_| {
                    Error::Config(format!("Invalid log level '{level}' for logger"))
                })?;
            }
            Ok(Arc::new(crate::RequestLogger::with_config(config)) as Arc<dyn Middleware>)
        });
        registry
    }

    /// Register a factory under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Option<&str>) -> Result<Arc<dyn Middleware>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(middleware = %name, "Middleware registered");
        self.factories.insert(name, Arc::new(factory));
        self
    }

    /// Register a shared instance; arguments are ignored
    pub fn register_instance(
        &mut self,
        name: impl Into<String>,
        middleware: Arc<dyn Middleware>,
    ) -> &mut Self {
        self.register(name, move |_| Ok(Arc::clone(&middleware)))
    }

    /// Whether the name part of `reference` is registered
    pub fn contains(&self, reference: &str) -> bool {
        let (name, _) = split_reference(reference);
        self.factories.contains_key(name)
    }

    /// Resolve `name` or `name:argument`
    pub fn resolve(&self, reference: &str) -> Result<Arc<dyn Middleware>> {
        let (name, argument) = split_reference(reference);
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::Config(format!("Middleware '{name}' is not registered"))
        })?;
        factory(argument)
    }

    /// Resolve a middleware reference
    pub fn resolve_ref(&self, reference: &MiddlewareRef) -> Result<Arc<dyn Middleware>> {
        match reference {
            MiddlewareRef::Inline(middleware) => Ok(Arc::clone(middleware)),
            MiddlewareRef::Named(name) => self.resolve(name),
        }
    }

    /// Resolve references in order
    pub fn resolve_all<'a, I>(&self, references: I) -> Result<Vec<Arc<dyn Middleware>>>
    where
        I: IntoIterator<Item = &'a MiddlewareRef>,
    {
        references
            .into_iter()
            .map(|reference| self.resolve_ref(reference))
            .collect()
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once(':') {
        Some((name, argument)) => (name, Some(argument)),
        None => (reference, None),
    }
}
