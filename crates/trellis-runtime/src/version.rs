//! Accept-header API versioning
//!
//! A [`VersionResolver`] picks the API version of a request. The
//! [`VersionRegistry`] maps `(version, controller, action)` to a transformer
//! middleware that the dispatcher inserts between route middleware and the
//! controller's around-actions.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use trellis_core::{Context, Error, MiddlewareRef, Result};

/// Picks the API version of a request
pub trait VersionResolver: Send + Sync + fmt::Debug {
    /// Version label such as `v2`, if any applies
    fn resolve(&self, ctx: &Context) -> Option<String>;
}

/// Reads `application/vnd.{vendor}.vN+json` from the `Accept` header
#[derive(Debug, Clone)]
pub struct AcceptHeaderVersion {
    pattern: Regex,
    default_version: String,
}

impl AcceptHeaderVersion {
    /// Create a resolver for `vendor`, defaulting to `v1`
    pub fn new(vendor: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"application/vnd\.{}\.(v\d+)\+json",
            regex::escape(vendor)
        ))
        .map_err(|e| Error::Config(format!("Invalid version vendor '{vendor}': {e}")))?;

        Ok(Self {
            pattern,
            default_version: "v1".to_string(),
        })
    }

    /// Version used when the header names none
    #[must_use]
    pub fn with_default(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }

    /// Default version
    pub fn default_version(&self) -> &str {
        &self.default_version
    }
}

impl VersionResolver for AcceptHeaderVersion {
    fn resolve(&self, ctx: &Context) -> Option<String> {
        let version = ctx
            .header("accept")
            .and_then(|accept| self.pattern.captures(accept))
            .and_then(|captures| captures.get(1))
            .map_or(self.default_version.as_str(), |m| m.as_str());
        Some(version.to_string())
    }
}

/// Transformers keyed by `"{version}/{controller}"`, then by action
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    transformers: BTreeMap<String, BTreeMap<String, MiddlewareRef>>,
}

impl VersionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the transformer for `controller#action` under `version`
    pub fn register(
        &mut self,
        version: &str,
        controller: &str,
        action: impl Into<String>,
        transformer: impl Into<MiddlewareRef>,
    ) -> &mut Self {
        let key = format!("{version}/{controller}");
        tracing::debug!(version = %key, "Version transformer registered");
        self.transformers
            .entry(key)
            .or_default()
            .insert(action.into(), transformer.into());
        self
    }

    /// Transformer for `controller#action` under `version`
    pub fn transformer(&self, version: &str, controller: &str, action: &str) -> Option<&MiddlewareRef> {
        self.transformers
            .get(&format!("{version}/{controller}"))
            .and_then(|actions| actions.get(action))
    }

    /// Every registered transformer
    pub fn transformers(&self) -> impl Iterator<Item = &MiddlewareRef> {
        self.transformers.values().flat_map(|actions| actions.values())
    }

    /// Number of `(version, controller)` entries
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method, Uri};

    fn context(accept: Option<&'static str>) -> Context {
        let mut ctx = Context::new(Method::GET, Uri::from_static("/users"));
        if let Some(accept) = accept {
            ctx.headers
                .insert("accept", HeaderValue::from_static(accept));
        }
        ctx
    }

    #[test]
    fn test_accept_header_version() {
        let resolver = AcceptHeaderVersion::new("trellis").unwrap();

        let ctx = context(Some("application/vnd.trellis.v2+json"));
        assert_eq!(resolver.resolve(&ctx).as_deref(), Some("v2"));

        let ctx = context(Some("application/json"));
        assert_eq!(resolver.resolve(&ctx).as_deref(), Some("v1"));

        let ctx = context(None);
        assert_eq!(resolver.resolve(&ctx).as_deref(), Some("v1"));
    }

    #[test]
    fn test_vendor_is_literal() {
        let resolver = AcceptHeaderVersion::new("acme.io").unwrap().with_default("v3");

        let ctx = context(Some("application/vnd.acmexio.v2+json"));
        assert_eq!(resolver.resolve(&ctx).as_deref(), Some("v3"));

        let ctx = context(Some("application/vnd.acme.io.v2+json"));
        assert_eq!(resolver.resolve(&ctx).as_deref(), Some("v2"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = VersionRegistry::new();
        registry
            .register("v2", "user", "show", "user_v2")
            .register("v2", "user", "index", "users_v2");

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.transformer("v2", "user", "show").map(MiddlewareRef::name),
            Some("user_v2")
        );
        assert!(registry.transformer("v1", "user", "show").is_none());
        assert!(registry.transformer("v2", "user", "destroy").is_none());
        assert_eq!(registry.transformers().count(), 2);
    }
}
