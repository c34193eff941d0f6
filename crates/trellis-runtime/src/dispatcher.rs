//! Request dispatch
//!
//! One request goes through:
//! 1. route matching
//! 2. controller and action resolution
//! 3. middleware assembly: global, route, version transformer, around-actions
//! 4. the onion chain ending in the action
//! 5. the responder, or the error handler on failure

use crate::registry::ControllerResolver;
use crate::responder::{
    DefaultResponder, ErrorHandler, ErrorOutcome, Responder, TextErrorResponder,
};
use crate::version::{VersionRegistry, VersionResolver};
use async_trait::async_trait;
use http::{Method, Response};
use std::fmt;
use std::sync::Arc;
use trellis_core::{
    Action, Chain, Context, Error, HttpBody, Middleware, MiddlewareRef, Next, Result,
};
use trellis_middleware::{filter_for_action, MiddlewareRegistry};
use trellis_router::{Handler, Router};

/// Invokes the action and stores its result
#[derive(Debug)]
struct Terminal {
    action: Arc<dyn Action>,
}

#[async_trait]
impl Middleware for Terminal {
    async fn call(&self, ctx: &mut Context, next: Next) -> Result<()> {
        if let Some(body) = self.action.call(ctx).await? {
            if !ctx.has_body() {
                ctx.set_body(body);
            }
        }
        next.run(ctx).await
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

/// Routes requests through the middleware chain to controller actions
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    controllers: Arc<dyn ControllerResolver>,
    middleware: Arc<MiddlewareRegistry>,
    global: Vec<Arc<dyn Middleware>>,
    versions: Option<(Arc<dyn VersionResolver>, Arc<VersionRegistry>)>,
    responder: Arc<dyn Responder>,
    error_handler: Arc<dyn ErrorHandler>,
    method_not_allowed: bool,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in middleware registry and responders
    pub fn new(router: Arc<Router>, controllers: Arc<dyn ControllerResolver>) -> Self {
        Self {
            router,
            controllers,
            middleware: Arc::new(MiddlewareRegistry::with_defaults()),
            global: Vec::new(),
            versions: None,
            responder: Arc::new(DefaultResponder),
            error_handler: Arc::new(TextErrorResponder),
            method_not_allowed: false,
        }
    }

    /// Resolve named middleware through `registry`
    #[must_use]
    pub fn with_middleware_registry(mut self, registry: Arc<MiddlewareRegistry>) -> Self {
        self.middleware = registry;
        self
    }

    /// Append a middleware run for every request
    #[must_use]
    pub fn with_global(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.global.push(middleware);
        self
    }

    /// Enable version transformers
    #[must_use]
    pub fn with_versions(
        mut self,
        resolver: Arc<dyn VersionResolver>,
        registry: Arc<VersionRegistry>,
    ) -> Self {
        self.versions = Some((resolver, registry));
        self
    }

    /// Replace the responder
    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }

    /// Replace the error handler
    #[must_use]
    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    /// Answer 405 instead of 404 when only the method fails to match
    #[must_use]
    pub fn with_method_not_allowed(mut self, enabled: bool) -> Self {
        self.method_not_allowed = enabled;
        self
    }

    /// Route tree
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Global middleware count
    pub fn global_len(&self) -> usize {
        self.global.len()
    }

    /// Dispatch a request and build its response.
    ///
    /// Returns `None` when the error handler could not write anything.
    pub async fn dispatch(&self, ctx: &mut Context) -> Option<Response<HttpBody>> {
        let result = match self.execute(ctx).await {
            Ok(()) => self.responder.respond(ctx).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => Some(response),
            Err(err) => {
                let status = err.to_status_code();
                if status.is_server_error() {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        method = %ctx.method,
                        path = %ctx.path(),
                        status = status.as_u16(),
                        error = %err,
                        "Dispatch failed"
                    );
                } else {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        method = %ctx.method,
                        path = %ctx.path(),
                        status = status.as_u16(),
                        error = %err,
                        "Request not served"
                    );
                }
                match self.error_handler.handle_error(ctx, &err) {
                    ErrorOutcome::Respond(response) => Some(response),
                    ErrorOutcome::AlreadyReported => None,
                }
            }
        }
    }

    /// Match, resolve and run the chain without producing a response
    pub async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let path = ctx.path().to_string();
        let Some(matched) = self.router.match_route(&path, &ctx.method)? else {
            return Err(self.unmatched(ctx, &path));
        };

        let (action, version, around) = match &matched.handler {
            Handler::Callable(action) => (Arc::clone(action), None, Vec::new()),
            Handler::Action { controller, action } => {
                let instance = self.controllers.resolve(controller).ok_or_else(|| {
                    Error::routing(format!("Controller {controller} not found"))
                })?;
                let resolved = instance.action(action).ok_or_else(|| {
                    Error::routing(format!("Action {controller}#{action} not found"))
                })?;
                (
                    resolved,
                    self.version_transformer(ctx, controller, action),
                    filter_for_action(instance.around_actions(), action),
                )
            }
        };

        ctx.route = Some(matched.info());
        ctx.params = matched.params;

        let mut stack = self.global.clone();
        stack.extend(self.middleware.resolve_all(matched.middleware.iter())?);
        if let Some(transformer) = version {
            stack.push(self.middleware.resolve_ref(&transformer)?);
        }
        stack.extend(self.middleware.resolve_all(around.iter())?);
        stack.push(Arc::new(Terminal { action }));

        tracing::debug!(
            request_id = %ctx.request_id,
            route = %matched.pattern,
            handler = %matched.handler,
            middleware = stack.len() - 1,
            "Route matched"
        );

        Chain::new(stack).invoke(ctx).await
    }

    /// Check that every controller, action and named middleware the router
    /// refers to can be resolved
    pub fn verify(&self) -> Result<()> {
        for route in self.router.routes() {
            for reference in route.middleware.iter() {
                self.verify_middleware(reference, &route.pattern)?;
            }

            let Handler::Action { controller, action } = &route.handler else {
                continue;
            };
            let instance = self.controllers.resolve(controller).ok_or_else(|| {
                Error::Config(format!(
                    "Controller {controller} not found (route {})",
                    route.pattern
                ))
            })?;
            if instance.action(action).is_none() {
                return Err(Error::Config(format!(
                    "Action {controller}#{action} not found (route {})",
                    route.pattern
                )));
            }
            for filter in instance.around_actions() {
                self.verify_middleware(filter.middleware(), controller)?;
            }
        }

        if let Some((_, registry)) = &self.versions {
            for transformer in registry.transformers() {
                self.verify_middleware(transformer, "version transformers")?;
            }
        }

        tracing::debug!(routes = self.router.len(), "Dispatcher verified");
        Ok(())
    }

    fn verify_middleware(&self, reference: &MiddlewareRef, owner: &str) -> Result<()> {
        match self.middleware.resolve_ref(reference) {
            Ok(_) => Ok(()),
            Err(Error::Config(message)) => {
                Err(Error::Config(format!("{message} (used by {owner})")))
            }
            Err(err) => Err(err),
        }
    }

    fn unmatched(&self, ctx: &mut Context, path: &str) -> Error {
        if self.method_not_allowed {
            let allowed = self.router.allowed_methods(path);
            if !allowed.is_empty() {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                ctx.set_header("allow", &allow);
                return Error::MethodNotAllowed {
                    method: ctx.method.to_string(),
                    path: path.to_string(),
                };
            }
        }
        Error::routing("No route matches")
    }

    fn version_transformer(
        &self,
        ctx: &Context,
        controller: &str,
        action: &str,
    ) -> Option<MiddlewareRef> {
        let (resolver, registry) = self.versions.as_ref()?;
        let version = resolver.resolve(ctx)?;
        registry.transformer(&version, controller, action).cloned()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("global_middleware", &self.global.len())
            .field("middleware_registry", &self.middleware)
            .field("versioned", &self.versions.is_some())
            .field("responder", &self.responder)
            .field("error_handler", &self.error_handler)
            .field("method_not_allowed", &self.method_not_allowed)
            .finish()
    }
}
