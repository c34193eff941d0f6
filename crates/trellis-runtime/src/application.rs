//! Application glue between `http` requests and the dispatcher

use crate::dispatcher::Dispatcher;
use crate::registry::ControllerRegistry;
use crate::responder::{ErrorHandler, Responder};
use crate::version::{AcceptHeaderVersion, VersionRegistry, VersionResolver};
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use std::sync::Arc;
use tracing::Instrument;
use trellis_config::Config;
use trellis_core::{Context, Error, Middleware, ResponseBuilder, Result};
use trellis_middleware::{LoggingConfig, MiddlewareBuilder, MiddlewareRegistry, RequestIdConfig};
use trellis_router::Router;

/// A router, its controllers and global middleware, ready to serve requests
#[derive(Debug, Clone)]
pub struct Application {
    dispatcher: Dispatcher,
}

impl Application {
    /// Create an application
    pub fn new(router: Router, controllers: ControllerRegistry) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(router), Arc::new(controllers)),
        }
    }

    /// Build an application from configuration.
    ///
    /// Routes come from the configuration's route tables; request id and
    /// logging middleware are installed when enabled; accept-header
    /// versioning uses `versions` when enabled.
    pub fn from_config(
        config: &Config,
        controllers: ControllerRegistry,
        middleware: MiddlewareRegistry,
        versions: VersionRegistry,
    ) -> Result<Self> {
        let router = trellis_config::build_router(config)?;

        let mut dispatcher = Dispatcher::new(Arc::new(router), Arc::new(controllers))
            .with_middleware_registry(Arc::new(middleware))
            .with_method_not_allowed(config.app.method_not_allowed);

        for layer in global_middleware(config)? {
            dispatcher = dispatcher.with_global(layer);
        }

        if config.versioning.enabled {
            let resolver = AcceptHeaderVersion::new(&config.versioning.vendor)?
                .with_default(config.versioning.default_version.clone());
            dispatcher = dispatcher.with_versions(Arc::new(resolver), Arc::new(versions));
        }

        tracing::info!(
            app = %config.app.name,
            env = %config.app.env,
            routes = dispatcher.router().len(),
            global_middleware = dispatcher.global_len(),
            "Application configured"
        );

        Ok(Self { dispatcher })
    }

    /// Append a middleware run for every request
    #[must_use]
    pub fn use_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.dispatcher = self.dispatcher.with_global(Arc::new(middleware));
        self
    }

    /// Resolve named middleware through `registry`
    #[must_use]
    pub fn with_middleware_registry(mut self, registry: MiddlewareRegistry) -> Self {
        self.dispatcher = self.dispatcher.with_middleware_registry(Arc::new(registry));
        self
    }

    /// Enable version transformers
    #[must_use]
    pub fn with_versions<V: VersionResolver + 'static>(
        mut self,
        resolver: V,
        registry: VersionRegistry,
    ) -> Self {
        self.dispatcher = self
            .dispatcher
            .with_versions(Arc::new(resolver), Arc::new(registry));
        self
    }

    /// Replace the responder
    #[must_use]
    pub fn with_responder<R: Responder + 'static>(mut self, responder: R) -> Self {
        self.dispatcher = self.dispatcher.with_responder(Arc::new(responder));
        self
    }

    /// Replace the error handler
    #[must_use]
    pub fn with_error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.dispatcher = self.dispatcher.with_error_handler(Arc::new(handler));
        self
    }

    /// Answer 405 instead of 404 when only the method fails to match
    #[must_use]
    pub fn with_method_not_allowed(mut self, enabled: bool) -> Self {
        self.dispatcher = self.dispatcher.with_method_not_allowed(enabled);
        self
    }

    /// Check every controller, action and named middleware up front
    pub fn verify(&self) -> Result<()> {
        self.dispatcher.verify()
    }

    /// Underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one request
    pub async fn handle(&self, request: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let mut ctx = Context::from_parts(parts, body);
        let span = tracing::info_span!(
            "request",
            method = %ctx.method,
            path = %ctx.path(),
        );

        match self.dispatcher.dispatch(&mut ctx).instrument(span).await {
            Some(response) => response,
            None => ResponseBuilder::new(
                ctx.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            )
            .empty(),
        }
    }
}

fn global_middleware(config: &Config) -> Result<Vec<Arc<dyn Middleware>>> {
    let settings = &config.middleware;
    let mut builder = MiddlewareBuilder::new();

    if settings.request_id.enabled {
        builder = builder.with_request_id_config(RequestIdConfig {
            header_name: settings.request_id.header.clone(),
            ..RequestIdConfig::default()
        });
    }

    if settings.logging.enabled {
        let log_level = settings.logging.level.parse().map_err(|_| {
            Error::Config(format!(
                "Invalid request log level: {}",
                settings.logging.level
            ))
        })?;
        builder = builder.with_logging_config(LoggingConfig {
            log_level,
            log_headers: settings.logging.log_headers,
            slow_threshold: settings.logging.slow_threshold,
            ..LoggingConfig::default()
        });
    }

    Ok(builder.build())
}
