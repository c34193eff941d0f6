//! Declarative routes to router tree

use crate::types::{Config, NamespaceConfig, ResourceConfig, RouteConfig};
use trellis_core::{MiddlewareRef, Result};
use trellis_router::{ResourceAction, ResourceOptions, RouteOptions, Router, RouterOptions};

/// Build the router described by the configuration.
///
/// Within each router, routes are registered before resources and
/// resources before namespaces.
pub fn build_router(config: &Config) -> Result<Router> {
    let mut options = RouterOptions::new()
        .with_case_sensitive(config.router.case_sensitive)
        .with_strict(config.router.strict);
    options.middleware = middleware_refs(&config.router.middleware);

    let mut router = Router::with_options(config.router.prefix.clone(), options);
    add_routes(&mut router, &config.routes)?;
    add_resources(&mut router, &config.resources)?;
    add_namespaces(&mut router, &config.namespaces)?;

    tracing::info!(routes = router.len(), "Router built from configuration");

    Ok(router)
}

fn middleware_refs(names: &[String]) -> Vec<MiddlewareRef> {
    names.iter().map(|name| MiddlewareRef::from(name.as_str())).collect()
}

fn add_routes(router: &mut Router, routes: &[RouteConfig]) -> Result<()> {
    for route in routes {
        let options = RouteOptions {
            middleware: middleware_refs(&route.middleware),
        };
        router.route_with(&route.methods, &route.path, route.to.as_str(), options)?;
    }
    Ok(())
}

fn add_resources(router: &mut Router, resources: &[ResourceConfig]) -> Result<()> {
    for resource in resources {
        let options = resource_options(resource)?;
        router.resource_with(&resource.name, options, |member, collection| {
            add_routes(collection, &resource.collection)?;
            add_routes(member, &resource.member)?;
            add_resources(member, &resource.resources)
        })?;
    }
    Ok(())
}

fn resource_options(resource: &ResourceConfig) -> Result<ResourceOptions> {
    let parse = |names: &[String]| -> Result<Vec<ResourceAction>> {
        names.iter().map(|name| name.parse()).collect()
    };

    let mut router = RouterOptions::new();
    router.middleware = middleware_refs(&resource.middleware);

    Ok(ResourceOptions {
        controller: resource.controller.clone(),
        param: resource.param.clone(),
        plural: resource.plural.clone(),
        only: resource.only.as_deref().map(parse).transpose()?,
        except: parse(&resource.except)?,
        router,
    })
}

fn add_namespaces(router: &mut Router, namespaces: &[NamespaceConfig]) -> Result<()> {
    for namespace in namespaces {
        let mut options = RouterOptions::new();
        options.middleware = middleware_refs(&namespace.middleware);
        options.controller_prefix = namespace.controller_prefix.clone();

        router.namespace_with(&namespace.name, options, |child| {
            add_routes(child, &namespace.routes)?;
            add_resources(child, &namespace.resources)?;
            add_namespaces(child, &namespace.namespaces)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn route(path: &str, methods: &[&str], to: &str) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            to: to.to_string(),
            middleware: Vec::new(),
        }
    }

    #[test]
    fn test_build_routes() {
        let mut config = Config::default();
        config.router.middleware = vec!["session".to_string()];
        config.routes.push(route("/users", &["get", "post"], "users#dispatch"));

        let router = build_router(&config).unwrap();
        let matched = router.match_route("/users", &Method::POST).unwrap().unwrap();
        assert_eq!(matched.handler.to_string(), "users#dispatch");
        assert_eq!(matched.middleware[0].name(), "session");
    }

    #[test]
    fn test_build_resource_tree() {
        let mut config = Config::default();
        config.resources.push(ResourceConfig {
            name: "post".to_string(),
            except: vec!["destroy".to_string()],
            middleware: vec!["auth".to_string()],
            collection: vec![route("/new", &["GET"], "post#new")],
            member: vec![route("/publish", &["POST"], "post#publish")],
            resources: vec![ResourceConfig {
                name: "comment".to_string(),
                only: Some(vec!["index".to_string()]),
                ..Default::default()
            }],
            ..Default::default()
        });

        let router = build_router(&config).unwrap();

        let new = router.match_route("/posts/new", &Method::GET).unwrap().unwrap();
        assert_eq!(new.handler.to_string(), "post#new");
        assert_eq!(new.middleware[0].name(), "auth");

        let publish = router
            .match_route("/posts/1/publish", &Method::POST)
            .unwrap()
            .unwrap();
        assert_eq!(publish.handler.to_string(), "post#publish");

        assert!(router.match_route("/posts/1", &Method::DELETE).unwrap().is_none());
        assert!(router
            .match_route("/posts/1/comments", &Method::GET)
            .unwrap()
            .is_some());
        assert!(router
            .match_route("/posts/1/comments/2", &Method::GET)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_build_namespaces() {
        let mut config = Config::default();
        config.namespaces.push(NamespaceConfig {
            name: "provider/:provider".to_string(),
            resources: vec![ResourceConfig {
                name: "file".to_string(),
                ..Default::default()
            }],
            namespaces: vec![NamespaceConfig {
                name: "admin".to_string(),
                controller_prefix: Some("ops".to_string()),
                routes: vec![route("/stats", &["GET"], "stats#index")],
                ..Default::default()
            }],
            ..Default::default()
        });

        let router = build_router(&config).unwrap();
        assert_eq!(
            router.handler_identifiers().into_iter().collect::<Vec<_>>(),
            vec!["provider/file", "provider/ops/stats"]
        );
    }

    #[test]
    fn test_invalid_action_name() {
        let mut config = Config::default();
        config.resources.push(ResourceConfig {
            name: "post".to_string(),
            only: Some(vec!["edit".to_string()]),
            ..Default::default()
        });
        assert!(build_router(&config).is_err());
    }
}
