//! Hierarchical router tree

use crate::inflect::pluralize;
use crate::matcher::MatchOptions;
use crate::route::{Handler, IntoHandler, Route, RouteMatch, RouteOptions};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use trellis_core::{normalize_method, Error, MiddlewareRef, Result, STANDARD_METHODS};

static NAMESPACE_CONTROLLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/?:?(\w+)").expect("valid namespace regex"));

/// Options a router passes down to its children.
///
/// Unset flags are inherited from the parent.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Middleware appended after the parent's middleware
    pub middleware: Vec<MiddlewareRef>,
    /// Controller name prefix, joined to the parent's with `/`
    pub controller_prefix: Option<String>,
    /// Case-sensitive literal matching
    pub case_sensitive: Option<bool>,
    /// Significant trailing slash
    pub strict: Option<bool>,
    /// Anchor templates at the end of the path
    pub end: Option<bool>,
}

impl RouterOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware reference
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Set the controller prefix
    #[must_use]
    pub fn with_controller_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.controller_prefix = Some(prefix.into());
        self
    }

    /// Set case-sensitive matching
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Set strict trailing slash handling
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Set end anchoring
    #[must_use]
    pub fn with_end(mut self, end: bool) -> Self {
        self.end = Some(end);
        self
    }
}

/// Conventional actions generated by [`Router::resource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    /// `GET /posts`
    Index,
    /// `POST /posts`
    Create,
    /// `GET /posts/:post`
    Show,
    /// `PUT /posts/:post`
    Update,
    /// `PATCH /posts/:post`
    Patch,
    /// `DELETE /posts/:post`
    Destroy,
}

impl ResourceAction {
    /// All conventional actions in registration order
    pub const ALL: [ResourceAction; 6] = [
        ResourceAction::Index,
        ResourceAction::Create,
        ResourceAction::Show,
        ResourceAction::Update,
        ResourceAction::Patch,
        ResourceAction::Destroy,
    ];

    /// Action name on the controller
    pub fn name(self) -> &'static str {
        match self {
            ResourceAction::Index => "index",
            ResourceAction::Create => "create",
            ResourceAction::Show => "show",
            ResourceAction::Update => "update",
            ResourceAction::Patch => "patch",
            ResourceAction::Destroy => "destroy",
        }
    }

    /// HTTP method the action is routed on
    pub fn method(self) -> Method {
        match self {
            ResourceAction::Index | ResourceAction::Show => Method::GET,
            ResourceAction::Create => Method::POST,
            ResourceAction::Update => Method::PUT,
            ResourceAction::Patch => Method::PATCH,
            ResourceAction::Destroy => Method::DELETE,
        }
    }

    /// Whether the action lives on the member router
    pub fn is_member(self) -> bool {
        !matches!(self, ResourceAction::Index | ResourceAction::Create)
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceAction::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("Unknown resource action '{s}'")))
    }
}

/// Options for [`Router::resource_with`]
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Controller name, defaults to the resource name
    pub controller: Option<String>,
    /// Member parameter name, defaults to the resource name
    pub param: Option<String>,
    /// Collection path segment, defaults to the pluralized name
    pub plural: Option<String>,
    /// Generate only these actions
    pub only: Option<Vec<ResourceAction>>,
    /// Skip these actions
    pub except: Vec<ResourceAction>,
    /// Options for the collection router
    pub router: RouterOptions,
}

impl ResourceOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the controller name
    #[must_use]
    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Set the member parameter name
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Set the collection path segment
    #[must_use]
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    /// Restrict generated actions
    #[must_use]
    pub fn with_only(mut self, actions: impl IntoIterator<Item = ResourceAction>) -> Self {
        self.only = Some(actions.into_iter().collect());
        self
    }

    /// Exclude generated actions
    #[must_use]
    pub fn with_except(mut self, actions: impl IntoIterator<Item = ResourceAction>) -> Self {
        self.except.extend(actions);
        self
    }

    /// Set collection router options
    #[must_use]
    pub fn with_router(mut self, router: RouterOptions) -> Self {
        self.router = router;
        self
    }

    fn generates(&self, action: ResourceAction) -> bool {
        let included = self
            .only
            .as_ref()
            .map_or(true, |only| only.contains(&action));
        included && !self.except.contains(&action)
    }
}

/// Flattened route description for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    /// Accepted methods
    pub methods: Vec<String>,
    /// Absolute path template
    pub pattern: String,
    /// Handler display (`controller#action` or `<callable>`)
    pub handler: String,
    /// Middleware names in execution order
    pub middleware: Vec<String>,
}

#[derive(Debug)]
enum Entry {
    Router(Router),
    Route(Route),
}

/// A node in the router tree.
///
/// Children are built from their parent's prefix and options and added to
/// the parent's stack once their builder returns. Matching walks the stack
/// in registration order and the first match wins.
#[derive(Debug)]
pub struct Router {
    /// Absolute prefix
    prefix: String,

    /// Inherited middleware, parent first
    middleware: Vec<MiddlewareRef>,

    /// Controller name prefix
    controller_prefix: Option<String>,

    /// Flags used to compile routes
    options: MatchOptions,

    /// Prefix contains no parameter markers
    plain_prefix: bool,

    /// Child routers and routes in registration order
    stack: Vec<Entry>,
}

impl Router {
    /// Create an empty root router
    pub fn new() -> Self {
        Self::with_options("", RouterOptions::default())
    }

    /// Create a root router with a prefix and options
    pub fn with_options(prefix: impl Into<String>, options: RouterOptions) -> Self {
        let defaults = MatchOptions::default();
        Self::from_parts(
            prefix.into(),
            options.middleware,
            options.controller_prefix.filter(|p| !p.is_empty()),
            MatchOptions {
                case_sensitive: options.case_sensitive.unwrap_or(defaults.case_sensitive),
                strict: options.strict.unwrap_or(defaults.strict),
                end: options.end.unwrap_or(defaults.end),
            },
        )
    }

    fn from_parts(
        prefix: String,
        middleware: Vec<MiddlewareRef>,
        controller_prefix: Option<String>,
        options: MatchOptions,
    ) -> Self {
        let plain_prefix = !prefix.contains(':') && !prefix.contains('*');
        Self {
            prefix,
            middleware,
            controller_prefix,
            options,
            plain_prefix,
            stack: Vec::new(),
        }
    }

    /// Build a child router under this one; it is not yet in the stack
    fn child(&self, relative_prefix: &str, options: RouterOptions) -> Router {
        let mut middleware = self.middleware.clone();
        middleware.extend(options.middleware);

        let own_prefix = options.controller_prefix.filter(|p| !p.is_empty());
        let controller_prefix = match (&self.controller_prefix, own_prefix) {
            (Some(parent), Some(own)) => Some(format!("{parent}/{own}")),
            (Some(parent), None) => Some(parent.clone()),
            (None, own) => own,
        };

        let match_options = MatchOptions {
            case_sensitive: options
                .case_sensitive
                .unwrap_or(self.options.case_sensitive),
            strict: options.strict.unwrap_or(self.options.strict),
            end: options.end.unwrap_or(self.options.end),
        };

        Router::from_parts(
            format!("{}{}", self.prefix, relative_prefix),
            middleware,
            controller_prefix,
            match_options,
        )
    }

    fn push_router(&mut self, router: Router) {
        tracing::debug!(
            prefix = %router.prefix,
            routes = router.len(),
            "Router mounted"
        );
        self.stack.push(Entry::Router(router));
    }

    /// Register a route for the given methods
    pub fn route<I, M>(
        &mut self,
        methods: I,
        path: &str,
        handler: impl IntoHandler,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        self.route_with(methods, path, handler, RouteOptions::default())
    }

    /// Register a route with route-level options
    pub fn route_with<I, M>(
        &mut self,
        methods: I,
        path: &str,
        handler: impl IntoHandler,
        options: RouteOptions,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for method in methods {
            let method = normalize_method(method.as_ref())?;
            if !normalized.contains(&method) {
                normalized.push(method);
            }
        }
        let methods = normalized;
        if methods.is_empty() {
            return Err(Error::Config(format!(
                "Route '{}{path}' declares no methods",
                self.prefix
            )));
        }

        let handler = handler.into_handler(self.controller_prefix.as_deref())?;
        let pattern = format!("{}{}", self.prefix, path);

        let mut middleware = self.middleware.clone();
        middleware.extend(options.middleware);

        let route = Route::new(methods, pattern, handler, middleware, self.options)?;

        tracing::debug!(
            methods = ?route.methods,
            pattern = %route.pattern,
            handler = %route.handler,
            "Route registered"
        );

        self.stack.push(Entry::Route(route));
        Ok(self)
    }

    /// Register a `GET` route
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::GET], path, handler)
    }

    /// Register a `POST` route
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::POST], path, handler)
    }

    /// Register a `PUT` route
    pub fn put(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::PUT], path, handler)
    }

    /// Register a `PATCH` route
    pub fn patch(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::PATCH], path, handler)
    }

    /// Register a `DELETE` route
    pub fn delete(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::DELETE], path, handler)
    }

    /// Register a `HEAD` route
    pub fn head(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::HEAD], path, handler)
    }

    /// Register an `OPTIONS` route
    pub fn options(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route([Method::OPTIONS], path, handler)
    }

    /// Register a route for every standard method
    pub fn all(&mut self, path: &str, handler: impl IntoHandler) -> Result<&mut Self> {
        self.route(STANDARD_METHODS, path, handler)
    }

    /// Register the six conventional routes of a resource
    pub fn resource(&mut self, name: &str) -> Result<&mut Self> {
        self.resource_with(name, ResourceOptions::default(), |_, _| Ok(()))
    }

    /// Register a resource with options and custom routes.
    ///
    /// `build` receives `(member, collection)` and runs before the
    /// conventional routes are added, so its routes take priority. Custom
    /// collection routes also win over every member route.
    pub fn resource_with<F>(
        &mut self,
        name: &str,
        options: ResourceOptions,
        build: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Router, &mut Router) -> Result<()>,
    {
        if name.is_empty() {
            return Err(Error::Config("Resource name must not be empty".to_string()));
        }

        let plural = options.plural.clone().unwrap_or_else(|| pluralize(name));
        let param = options.param.clone().unwrap_or_else(|| param_name(name));
        let controller = options.controller.clone().unwrap_or_else(|| name.to_string());

        let mut collection = self.child(&format!("/{plural}"), options.router.clone());
        let mut member = collection.child(&format!("/:{param}"), RouterOptions::default());

        build(&mut member, &mut collection)?;

        for action in ResourceAction::ALL {
            if !options.generates(action) {
                continue;
            }
            let target = if action.is_member() {
                &mut member
            } else {
                &mut collection
            };
            target.route([action.method()], "", format!("{controller}#{action}"))?;
        }

        collection.push_router(member);
        self.push_router(collection);
        Ok(self)
    }

    /// Mount a namespace at `/{name}`
    pub fn namespace<F>(&mut self, name: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Router) -> Result<()>,
    {
        self.namespace_with(name, RouterOptions::default(), build)
    }

    /// Mount a namespace with options.
    ///
    /// The controller prefix defaults to the first word of `name`, so
    /// `provider/:provider` prefixes controllers with `provider`.
    pub fn namespace_with<F>(
        &mut self,
        name: &str,
        options: RouterOptions,
        build: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Router) -> Result<()>,
    {
        let mut options = options;
        if options.controller_prefix.is_none() {
            options.controller_prefix = NAMESPACE_CONTROLLER
                .captures(name)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
        }

        let mut router = self.child(&format!("/{}", name.trim_start_matches('/')), options);
        build(&mut router)?;
        self.push_router(router);
        Ok(self)
    }

    /// Apply shared options to a block of routes without adding a path segment
    pub fn group<F>(&mut self, options: RouterOptions, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Router) -> Result<()>,
    {
        let mut router = self.child("", options);
        build(&mut router)?;
        self.push_router(router);
        Ok(self)
    }

    /// Whether `path` can match anything below this router
    fn may_contain(&self, path: &str) -> bool {
        if !self.plain_prefix {
            return true;
        }
        let prefix = if self.options.strict {
            self.prefix.as_str()
        } else {
            self.prefix.strip_suffix('/').unwrap_or(&self.prefix)
        };
        if self.options.case_sensitive {
            path.starts_with(prefix)
        } else {
            path.len() >= prefix.len()
                && path.is_char_boundary(prefix.len())
                && path[..prefix.len()].eq_ignore_ascii_case(prefix)
        }
    }

    /// Find the first route matching `path` and `method`.
    ///
    /// Walks the stack depth-first in registration order. Subtrees whose
    /// literal prefix cannot match are skipped.
    pub fn match_route(&self, path: &str, method: &Method) -> Result<Option<RouteMatch>> {
        if !self.may_contain(path) {
            return Ok(None);
        }

        for entry in &self.stack {
            let matched = match entry {
                Entry::Router(router) => router.match_route(path, method)?,
                Entry::Route(route) => route.matches(path, method)?,
            };
            if let Some(matched) = matched {
                tracing::debug!(
                    path = %path,
                    method = %method,
                    pattern = %matched.pattern,
                    handler = %matched.handler,
                    "Route matched"
                );
                return Ok(Some(matched));
            }
        }

        Ok(None)
    }

    /// Methods of every route whose template matches `path`
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods = Vec::new();
        self.collect_allowed(path, &mut methods);
        methods
    }

    fn collect_allowed(&self, path: &str, methods: &mut Vec<Method>) {
        if !self.may_contain(path) {
            return;
        }
        for entry in &self.stack {
            match entry {
                Entry::Router(router) => router.collect_allowed(path, methods),
                Entry::Route(route) if route.matches_path(path) => {
                    for method in &route.methods {
                        if !methods.contains(method) {
                            methods.push(method.clone());
                        }
                    }
                }
                Entry::Route(_) => {}
            }
        }
    }

    /// Distinct controller names referenced anywhere in this tree
    pub fn handler_identifiers(&self) -> BTreeSet<String> {
        self.routes()
            .into_iter()
            .filter_map(|route| route.handler.controller().map(str::to_string))
            .collect()
    }

    /// Every route in match order
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes = Vec::new();
        self.collect_routes(&mut routes);
        routes
    }

    fn collect_routes<'a>(&'a self, routes: &mut Vec<&'a Route>) {
        for entry in &self.stack {
            match entry {
                Entry::Router(router) => router.collect_routes(routes),
                Entry::Route(route) => routes.push(route),
            }
        }
    }

    /// Flattened listing of every route in match order
    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes()
            .into_iter()
            .map(|route| RouteSummary {
                methods: route.methods.iter().map(|m| m.to_string()).collect(),
                pattern: route.pattern.clone(),
                handler: route.handler.to_string(),
                middleware: route.middleware.iter().map(|m| m.name().to_string()).collect(),
            })
            .collect()
    }

    /// Controller actions referenced anywhere in this tree
    pub fn actions(&self) -> Vec<(&str, &str)> {
        self.routes()
            .into_iter()
            .filter_map(|route| match &route.handler {
                Handler::Action { controller, action } => {
                    Some((controller.as_str(), action.as_str()))
                }
                Handler::Callable(_) => None,
            })
            .collect()
    }

    /// Absolute prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Controller name prefix
    pub fn controller_prefix(&self) -> Option<&str> {
        self.controller_prefix.as_deref()
    }

    /// Inherited middleware
    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    /// Flags routes are compiled with
    pub fn match_options(&self) -> MatchOptions {
        self.options
    }

    /// Total number of routes in this tree
    pub fn len(&self) -> usize {
        self.stack
            .iter()
            .map(|entry| match entry {
                Entry::Router(router) => router.len(),
                Entry::Route(_) => 1,
            })
            .sum()
    }

    /// Whether the tree holds no routes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter name derived from a resource name
fn param_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_of(router: &Router, path: &str, method: Method) -> Option<String> {
        router
            .match_route(path, &method)
            .unwrap()
            .map(|m| m.handler.to_string())
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.prefix(), "");
    }

    #[test]
    fn test_verb_routes() {
        let mut router = Router::new();
        router
            .get("/users", "users#index")
            .unwrap()
            .post("/users", "users#create")
            .unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(handler_of(&router, "/users", Method::GET).as_deref(), Some("users#index"));
        assert_eq!(handler_of(&router, "/users", Method::POST).as_deref(), Some("users#create"));
        assert_eq!(handler_of(&router, "/users", Method::DELETE), None);
    }

    #[test]
    fn test_invalid_handler_string() {
        let mut router = Router::new();
        let err = router.get("/users", "users").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_route_method_tokens_normalized() {
        let mut router = Router::new();
        router.route(["get", "Post"], "/items", "items#handle").unwrap();

        let routes = router.routes();
        assert_eq!(routes[0].methods, vec![Method::GET, Method::POST]);
        assert!(router.route(Vec::<&str>::new(), "/none", "items#none").is_err());
    }

    #[test]
    fn test_all_registers_standard_methods() {
        let mut router = Router::new();
        router.all("/ping", "health#ping").unwrap();
        assert_eq!(router.routes()[0].methods.len(), STANDARD_METHODS.len());
        assert!(handler_of(&router, "/ping", Method::OPTIONS).is_some());
    }

    #[test]
    fn test_resource_routes() {
        let mut router = Router::new();
        router.resource("post").unwrap();

        let summaries = router.summaries();
        let listing: Vec<_> = summaries
            .iter()
            .map(|s| (s.methods[0].as_str(), s.pattern.as_str(), s.handler.as_str()))
            .collect();

        assert_eq!(
            listing,
            vec![
                ("GET", "/posts", "post#index"),
                ("POST", "/posts", "post#create"),
                ("GET", "/posts/:post", "post#show"),
                ("PUT", "/posts/:post", "post#update"),
                ("PATCH", "/posts/:post", "post#patch"),
                ("DELETE", "/posts/:post", "post#destroy"),
            ]
        );

        let matched = router.match_route("/posts/9", &Method::PUT).unwrap().unwrap();
        assert_eq!(matched.params.get("post"), Some("9"));
        assert!(router.match_route("/posts/new", &Method::POST).unwrap().is_none());
    }

    #[test]
    fn test_resource_custom_collection_route_wins() {
        let mut router = Router::new();
        router
            .resource_with("post", ResourceOptions::new(), |_member, collection| {
                collection.get("/new", "post#new")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(handler_of(&router, "/posts/new", Method::GET).as_deref(), Some("post#new"));
        assert_eq!(handler_of(&router, "/posts/3", Method::GET).as_deref(), Some("post#show"));
    }

    #[test]
    fn test_resource_custom_member_route_wins() {
        let mut router = Router::new();
        router
            .resource_with("post", ResourceOptions::new(), |member, _collection| {
                member.get("", "post#preview")?;
                member.post("/publish", "post#publish")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(handler_of(&router, "/posts/3", Method::GET).as_deref(), Some("post#preview"));
        assert_eq!(
            handler_of(&router, "/posts/3/publish", Method::POST).as_deref(),
            Some("post#publish")
        );
    }

    #[test]
    fn test_nested_resource() {
        let mut router = Router::new();
        router
            .resource_with("post", ResourceOptions::new(), |member, _| {
                member.resource("comment")?;
                Ok(())
            })
            .unwrap();

        let matched = router
            .match_route("/posts/4/comments/2", &Method::DELETE)
            .unwrap()
            .unwrap();
        assert_eq!(matched.handler.to_string(), "comment#destroy");
        assert_eq!(matched.params.names().collect::<Vec<_>>(), vec!["post", "comment"]);
    }

    #[test]
    fn test_resource_only_except() {
        let mut router = Router::new();
        router
            .resource_with(
                "photo",
                ResourceOptions::new().with_only([ResourceAction::Index, ResourceAction::Show]),
                |_, _| Ok(()),
            )
            .unwrap();
        router
            .resource_with(
                "tag",
                ResourceOptions::new().with_except([ResourceAction::Destroy]),
                |_, _| Ok(()),
            )
            .unwrap();

        let handlers: Vec<_> = router.summaries().into_iter().map(|s| s.handler).collect();
        assert_eq!(
            handlers,
            vec![
                "photo#index",
                "photo#show",
                "tag#index",
                "tag#create",
                "tag#show",
                "tag#update",
                "tag#patch",
            ]
        );
    }

    #[test]
    fn test_resource_options() {
        let mut router = Router::new();
        router
            .resource_with(
                "person",
                ResourceOptions::new()
                    .with_controller("members")
                    .with_param("id")
                    .with_router(RouterOptions::new().with_middleware("auth")),
                |_, _| Ok(()),
            )
            .unwrap();

        let matched = router.match_route("/people/5", &Method::GET).unwrap().unwrap();
        assert_eq!(matched.handler.to_string(), "members#show");
        assert_eq!(matched.params.get("id"), Some("5"));
        assert_eq!(matched.middleware.len(), 1);
        assert_eq!(matched.middleware[0].name(), "auth");

        let mut router = Router::new();
        router
            .resource_with("child", ResourceOptions::new().with_plural("kids"), |_, _| Ok(()))
            .unwrap();
        assert!(handler_of(&router, "/kids", Method::GET).is_some());
    }

    #[test]
    fn test_resource_action_parse() {
        assert_eq!("Show".parse::<ResourceAction>().unwrap(), ResourceAction::Show);
        assert!("edit".parse::<ResourceAction>().is_err());
    }

    #[test]
    fn test_namespace_controller_prefix() {
        let mut router = Router::new();
        router
            .namespace("provider/:provider", |r| {
                r.resource("file")?;
                Ok(())
            })
            .unwrap();

        let matched = router
            .match_route("/provider/dropbox/files/7", &Method::GET)
            .unwrap()
            .unwrap();
        assert_eq!(matched.handler.to_string(), "provider/file#show");
        assert_eq!(matched.params.get("provider"), Some("dropbox"));
        assert_eq!(
            router.handler_identifiers().into_iter().collect::<Vec<_>>(),
            vec!["provider/file"]
        );
    }

    #[test]
    fn test_nested_namespaces_join_prefixes() {
        let mut router = Router::new();
        router
            .namespace("api", |api| {
                api.namespace_with(
                    "admin",
                    RouterOptions::new().with_middleware("admin"),
                    |admin| {
                        admin.get("/stats", "stats#index")?;
                        Ok(())
                    },
                )?;
                Ok(())
            })
            .unwrap();

        let matched = router
            .match_route("/api/admin/stats", &Method::GET)
            .unwrap()
            .unwrap();
        assert_eq!(matched.handler.to_string(), "api/admin/stats#index");
        assert_eq!(matched.middleware[0].name(), "admin");
    }

    #[test]
    fn test_namespace_controller_prefix_override() {
        let mut router = Router::new();
        router
            .namespace_with(
                ":tenant/admin",
                RouterOptions::new().with_controller_prefix("backoffice"),
                |r| {
                    r.get("/users", "users#index")?;
                    Ok(())
                },
            )
            .unwrap();

        let matched = router
            .match_route("/acme/admin/users", &Method::GET)
            .unwrap()
            .unwrap();
        assert_eq!(matched.handler.to_string(), "backoffice/users#index");
    }

    #[test]
    fn test_group_applies_middleware_without_segment() {
        let mut router = Router::new();
        router
            .group(RouterOptions::new().with_middleware("auth"), |r| {
                r.get("/account", "account#show")?;
                Ok(())
            })
            .unwrap();
        router.get("/public", "pages#show").unwrap();

        let account = router.match_route("/account", &Method::GET).unwrap().unwrap();
        assert_eq!(account.middleware.len(), 1);

        let public = router.match_route("/public", &Method::GET).unwrap().unwrap();
        assert!(public.middleware.is_empty());
    }

    #[test]
    fn test_middleware_order_parent_first() {
        let mut router = Router::with_options("", RouterOptions::new().with_middleware("a"));
        router
            .group(RouterOptions::new().with_middleware("b"), |r| {
                r.route_with(
                    [Method::GET],
                    "/x",
                    "x#show",
                    RouteOptions::new().with_middleware("c"),
                )?;
                Ok(())
            })
            .unwrap();

        let matched = router.match_route("/x", &Method::GET).unwrap().unwrap();
        let names: Vec<_> = matched.middleware.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router.get("/match/:id", "first#show").unwrap();
        router.get("/match/:id", "second#show").unwrap();

        assert_eq!(handler_of(&router, "/match/1", Method::GET).as_deref(), Some("first#show"));
    }

    #[test]
    fn test_plain_prefix_short_circuit() {
        let mut router = Router::new();
        router
            .namespace("api", |r| {
                r.get("/users", "users#index")?;
                Ok(())
            })
            .unwrap();

        assert!(router.match_route("/users", &Method::GET).unwrap().is_none());
        assert!(router.match_route("/API/users", &Method::GET).unwrap().is_none());
    }

    #[test]
    fn test_case_insensitive_group() {
        let mut router = Router::new();
        router
            .namespace_with("Api", RouterOptions::new().with_case_sensitive(false), |r| {
                r.get("/Users", "users#index")?;
                Ok(())
            })
            .unwrap();

        assert!(router.match_route("/api/users", &Method::GET).unwrap().is_some());
    }

    #[test]
    fn test_malformed_param_propagates() {
        let mut router = Router::new();
        router.get("/files/:name", "files#show").unwrap();

        let err = router.match_route("/files/%E0%A4%A", &Method::GET).unwrap_err();
        assert!(matches!(err, Error::MalformedParameter { .. }));
    }

    #[test]
    fn test_duplicate_methods_collapse() {
        let mut router = Router::new();
        router.route(["GET", "get", "Post"], "/feed", "feed#index").unwrap();

        assert_eq!(router.routes()[0].methods, vec![Method::GET, Method::POST]);
        assert_eq!(router.summaries()[0].methods, vec!["GET", "POST"]);
        assert_eq!(router.allowed_methods("/feed"), vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_index_under_namespace_ignores_trailing_slash() {
        let mut router = Router::new();
        router
            .namespace("api", |r| {
                r.get("/", "home#index")?;
                Ok(())
            })
            .unwrap();

        for path in ["/api", "/api/"] {
            let matched = router.match_route(path, &Method::GET).unwrap().unwrap();
            assert_eq!(matched.handler.to_string(), "api/home#index");
        }
    }

    #[test]
    fn test_allowed_methods() {
        let mut router = Router::new();
        router.resource("post").unwrap();

        assert_eq!(
            router.allowed_methods("/posts/1"),
            vec![Method::GET, Method::PUT, Method::PATCH, Method::DELETE]
        );
        assert!(router.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_handler_identifiers() {
        let mut router = Router::new();
        router.get("/users", "users#index").unwrap();
        router
            .namespace("provider/:provider", |r| {
                r.resource("file")?;
                Ok(())
            })
            .unwrap();
        router
            .namespace("oauth", |r| {
                r.post("/token", "index#token")?;
                Ok(())
            })
            .unwrap();
        router
            .resource_with("captcha", ResourceOptions::new(), |_, collection| {
                collection.get("/action/needs", "captcha#needs")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(
            router.handler_identifiers().into_iter().collect::<Vec<_>>(),
            vec!["captcha", "oauth/index", "provider/file", "users"]
        );
    }

    #[test]
    fn test_builder_error_propagates() {
        let mut router = Router::new();
        let result = router.namespace("api", |r| {
            r.get("/broken", "no-action")?;
            Ok(())
        });

        assert!(result.is_err());
        assert!(router.is_empty());
    }

    #[test]
    fn test_param_name_sanitized() {
        assert_eq!(param_name("blog-post"), "blog_post");
        assert_eq!(param_name("post"), "post");
    }
}
