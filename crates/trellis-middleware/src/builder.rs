//! Assembly of the global middleware stack
//!
//! Global middleware runs for every dispatched request, ahead of route
//! middleware and controller around-actions.

use crate::{LoggingConfig, MiddlewareRegistry, RequestId, RequestIdConfig, RequestLogger};
use std::sync::Arc;
use trellis_core::{Middleware, MiddlewareRef, Result};

/// Collects global middleware in run order
#[derive(Debug, Default)]
pub struct MiddlewareBuilder {
    stack: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareBuilder {
    /// Start an empty stack
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append [`RequestId`] with its defaults
    #[must_use]
    pub fn with_request_id(self) -> Self {
        self.with_middleware(Arc::new(RequestId::new()))
    }

    /// Append [`RequestId`] configured by `config`
    #[must_use]
    pub fn with_request_id_config(self, config: RequestIdConfig) -> Self {
        self.with_middleware(Arc::new(RequestId::with_config(config)))
    }

    /// Append [`RequestLogger`] with its defaults
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.with_middleware(Arc::new(RequestLogger::new()))
    }

    /// Append [`RequestLogger`] configured by `config`
    #[must_use]
    pub fn with_logging_config(self, config: LoggingConfig) -> Self {
        self.with_middleware(Arc::new(RequestLogger::with_config(config)))
    }

    /// Append an instance
    #[must_use]
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.stack.push(middleware);
        self
    }

    /// Append a registered middleware, `name` or `name:argument`
    pub fn with_named(self, registry: &MiddlewareRegistry, reference: &str) -> Result<Self> {
        Ok(self.with_middleware(registry.resolve(reference)?))
    }

    /// Append every reference in order, resolving named ones through `registry`
    pub fn with_refs<'a, I>(mut self, registry: &MiddlewareRegistry, references: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a MiddlewareRef>,
    {
        self.stack.extend(registry.resolve_all(references)?);
        Ok(self)
    }

    /// Finish, yielding the stack in run order
    #[must_use]
    pub fn build(self) -> Vec<Arc<dyn Middleware>> {
        self.stack
    }

    /// Number of layers so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether no layer was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(stack: &[Arc<dyn Middleware>]) -> Vec<&str> {
        stack.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn test_empty_stack() {
        let builder = MiddlewareBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_run_order_follows_calls() {
        let stack = MiddlewareBuilder::new()
            .with_logging()
            .with_request_id_config(RequestIdConfig {
                header_name: "X-Trace-ID".to_string(),
                ..Default::default()
            })
            .build();
        assert_eq!(names(&stack), vec!["logger", "request_id"]);
    }

    #[test]
    fn test_named_and_refs() {
        let registry = MiddlewareRegistry::with_defaults();
        let refs = [MiddlewareRef::from("request_id"), MiddlewareRef::from("logger:warn")];

        let builder = MiddlewareBuilder::new()
            .with_named(&registry, "logger:debug")
            .unwrap()
            .with_refs(&registry, refs.iter())
            .unwrap();
        assert_eq!(builder.len(), 3);
        assert_eq!(names(&builder.build()), vec!["logger", "request_id", "logger"]);

        assert!(MiddlewareBuilder::new().with_named(&registry, "session").is_err());
        assert!(MiddlewareBuilder::new()
            .with_refs(&registry, [MiddlewareRef::from("logger:loud")].iter())
            .is_err());
    }
}
