//! Route definition and handler descriptors

use crate::matcher::{MatchOptions, PatternMatcher};
use http::Method;
use std::fmt;
use std::sync::Arc;
use trellis_core::{method_eq, Action, Error, MiddlewareRef, Params, Result, RouteInfo};

/// What a route dispatches to
#[derive(Clone)]
pub enum Handler {
    /// Controller action, resolved through the controller registry
    Action {
        /// Controller name, possibly namespaced (`provider/file`)
        controller: String,
        /// Action name on the controller
        action: String,
    },

    /// Callable invoked directly
    Callable(Arc<dyn Action>),
}

impl Handler {
    /// Wrap an action as a callable handler
    pub fn callable<A: Action + 'static>(action: A) -> Self {
        Handler::Callable(Arc::new(action))
    }

    /// Parse `controller#action`
    pub fn parse(descriptor: &str) -> Result<Self> {
        let (controller, action) = descriptor.split_once('#').ok_or_else(|| {
            Error::Config(format!(
                "Handler '{descriptor}' must have the form 'controller#action'"
            ))
        })?;
        if controller.is_empty() || action.is_empty() {
            return Err(Error::Config(format!(
                "Handler '{descriptor}' names an empty controller or action"
            )));
        }
        Ok(Handler::Action {
            controller: controller.to_string(),
            action: action.to_string(),
        })
    }

    /// Controller name, if this is a controller action
    pub fn controller(&self) -> Option<&str> {
        match self {
            Handler::Action { controller, .. } => Some(controller),
            Handler::Callable(_) => None,
        }
    }

    /// Action name, if this is a controller action
    pub fn action(&self) -> Option<&str> {
        match self {
            Handler::Action { action, .. } => Some(action),
            Handler::Callable(_) => None,
        }
    }

    fn with_controller_prefix(self, prefix: Option<&str>) -> Self {
        match (self, prefix) {
            (Handler::Action { controller, action }, Some(prefix)) => Handler::Action {
                controller: format!("{prefix}/{controller}"),
                action,
            },
            (handler, _) => handler,
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action { controller, action } => write!(f, "{controller}#{action}"),
            Handler::Callable(_) => f.write_str("<callable>"),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action { controller, action } => f
                .debug_struct("Action")
                .field("controller", controller)
                .field("action", action)
                .finish(),
            Handler::Callable(action) => f.debug_tuple("Callable").field(action).finish(),
        }
    }
}

/// Conversion into a [`Handler`], applying the router's controller prefix
pub trait IntoHandler {
    /// Convert, prefixing controller names with `controller_prefix`
    fn into_handler(self, controller_prefix: Option<&str>) -> Result<Handler>;
}

impl IntoHandler for &str {
    fn into_handler(self, controller_prefix: Option<&str>) -> Result<Handler> {
        Ok(Handler::parse(self)?.with_controller_prefix(controller_prefix))
    }
}

impl IntoHandler for String {
    fn into_handler(self, controller_prefix: Option<&str>) -> Result<Handler> {
        self.as_str().into_handler(controller_prefix)
    }
}

impl IntoHandler for &String {
    fn into_handler(self, controller_prefix: Option<&str>) -> Result<Handler> {
        self.as_str().into_handler(controller_prefix)
    }
}

impl IntoHandler for Handler {
    fn into_handler(self, controller_prefix: Option<&str>) -> Result<Handler> {
        Ok(self.with_controller_prefix(controller_prefix))
    }
}

impl IntoHandler for Arc<dyn Action> {
    fn into_handler(self, _controller_prefix: Option<&str>) -> Result<Handler> {
        Ok(Handler::Callable(self))
    }
}

/// Per-route options
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Middleware appended after the router's inherited middleware
    pub middleware: Vec<MiddlewareRef>,
}

impl RouteOptions {
    /// Create empty route options
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware reference
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }
}

/// A registered route
#[derive(Debug, Clone)]
pub struct Route {
    /// Accepted methods, upper case
    pub methods: Vec<Method>,

    /// Absolute path template
    pub pattern: String,

    /// Dispatch target
    pub handler: Handler,

    /// Inherited middleware followed by route-level middleware
    pub middleware: Arc<[MiddlewareRef]>,

    matcher: PatternMatcher,
}

impl Route {
    /// Compile a route
    pub fn new(
        methods: Vec<Method>,
        pattern: impl Into<String>,
        handler: Handler,
        middleware: Vec<MiddlewareRef>,
        options: MatchOptions,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = PatternMatcher::with_options(pattern.clone(), options)?;

        Ok(Self {
            methods,
            pattern,
            handler,
            middleware: middleware.into(),
            matcher,
        })
    }

    /// Whether this route accepts `method`
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.iter().any(|m| method_eq(m, method))
    }

    /// Whether the template matches `path`, ignoring the method
    pub fn matches_path(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Match a request.
    ///
    /// The method is only consulted once the path matches, and parameters
    /// are only decoded once both match.
    pub fn matches(&self, path: &str, method: &Method) -> Result<Option<RouteMatch>> {
        let Some(captures) = self.matcher.capture(path) else {
            return Ok(None);
        };
        if !self.accepts(method) {
            return Ok(None);
        }

        let params = captures.decode()?;
        Ok(Some(RouteMatch {
            params,
            matched_path: captures.matched.to_string(),
            pattern: self.pattern.clone(),
            methods: self.methods.clone(),
            handler: self.handler.clone(),
            middleware: Arc::clone(&self.middleware),
        }))
    }

    /// Compiled matcher
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }
}

/// Result of a successful match, consumed by the dispatcher
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Decoded parameters in declaration order
    pub params: Params,
    /// Portion of the path consumed by the template
    pub matched_path: String,
    /// Template of the matched route
    pub pattern: String,
    /// Methods of the matched route
    pub methods: Vec<Method>,
    /// Dispatch target
    pub handler: Handler,
    /// Route middleware snapshot
    pub middleware: Arc<[MiddlewareRef]>,
}

impl RouteMatch {
    /// Route description attached to the request context
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            pattern: self.pattern.clone(),
            methods: self.methods.clone(),
            handler: self.handler.to_string(),
            matched_path: self.matched_path.clone(),
        }
    }
}
