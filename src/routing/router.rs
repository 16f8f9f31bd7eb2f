//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Collect endpoints during application setup
//! - Compile them into a routing tree before the first request
//! - Look up the endpoint for a method + path
//!
//! # Design Decisions
//! - Registration only buffers; duplicates surface in `compile`
//! - Immutable after compilation (thread-safe without locks)
//! - Explicit `None` on a miss rather than a silent default

use std::sync::Arc;

use axum::http::Method;

use crate::engine::endpoint::Endpoint;
use crate::routing::error::RouteError;
use crate::routing::template::RouteTemplate;
use crate::routing::tree::{RouteEntry, RoutingTree};

/// Maps method + path to a registered endpoint.
pub trait Router: Send + Sync {
    /// Buffer an endpoint; returns it so authorizers can be attached.
    fn add_endpoint(&mut self, endpoint: Endpoint) -> &mut Endpoint;

    /// Build the lookup structure from every buffered endpoint.
    fn compile(&mut self) -> Result<(), RouteError>;

    /// Resolve an endpoint. Never fails; a miss is `None`.
    fn match_route(&self, method: &Method, path: &str) -> Option<Arc<Endpoint>>;
}

impl RouteEntry for Endpoint {
    fn method(&self) -> &Method {
        Endpoint::method(self)
    }

    fn template(&self) -> &RouteTemplate {
        Endpoint::template(self)
    }
}

/// Default router backed by a [`RoutingTree`].
pub struct TreeRouter {
    pending: Vec<Endpoint>,
    compiled: Vec<Arc<Endpoint>>,
    tree: RoutingTree<Endpoint>,
}

impl TreeRouter {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            compiled: Vec::new(),
            tree: RoutingTree::empty(),
        }
    }

    /// Endpoints that are part of the compiled tree.
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.compiled
    }

    /// Endpoints registered since the last successful compile.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn tree(&self) -> &RoutingTree<Endpoint> {
        &self.tree
    }
}

impl Default for TreeRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for TreeRouter {
    fn add_endpoint(&mut self, endpoint: Endpoint) -> &mut Endpoint {
        self.pending.push(endpoint);
        let last = self.pending.len() - 1;
        &mut self.pending[last]
    }

    fn compile(&mut self) -> Result<(), RouteError> {
        let fresh: Vec<Arc<Endpoint>> = self.pending.drain(..).map(Arc::new).collect();
        let mut endpoints = self.compiled.clone();
        endpoints.extend(fresh.iter().cloned());

        match RoutingTree::compile(endpoints.clone()) {
            Ok(tree) => {
                self.tree = tree;
                self.compiled = endpoints;
            }
            Err(e) => {
                // The failed tree and `endpoints` are gone, so each fresh Arc is unique again.
                drop(endpoints);
                self.pending = fresh
                    .into_iter()
                    .filter_map(|endpoint| Arc::try_unwrap(endpoint).ok())
                    .collect();
                return Err(e);
            }
        }

        for endpoint in &self.compiled {
            tracing::debug!(
                method = %endpoint.method(),
                template = %endpoint.template(),
                "Route registered"
            );
        }
        tracing::info!(routes = self.compiled.len(), "Routing tree compiled");
        Ok(())
    }

    fn match_route(&self, method: &Method, path: &str) -> Option<Arc<Endpoint>> {
        let rest = path.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        self.tree.find(method, &segments).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn build_router(routes: &[(Method, &str)]) -> TreeRouter {
        let mut router = TreeRouter::new();
        for (method, template) in routes {
            router.add_endpoint(Endpoint::new(method.clone(), template, ok).unwrap());
        }
        router
    }

    fn matched(router: &TreeRouter, method: Method, path: &str) -> Option<String> {
        router
            .match_route(&method, path)
            .map(|e| e.template().to_string())
    }

    #[test]
    fn test_empty_router_matches_nothing() {
        let mut router = build_router(&[]);
        router.compile().unwrap();
        assert_eq!(matched(&router, Method::GET, "/"), None);
        assert_eq!(matched(&router, Method::GET, "/api"), None);
        assert_eq!(matched(&router, Method::GET, ""), None);
    }

    #[test]
    fn test_uncompiled_router_matches_nothing() {
        let router = build_router(&[(Method::GET, "/api")]);
        assert_eq!(matched(&router, Method::GET, "/api"), None);
    }

    #[test]
    fn test_literal_beats_parameter() {
        let mut router = build_router(&[
            (Method::GET, "/api/users/{name}"),
            (Method::GET, "/api/users/man"),
        ]);
        router.compile().unwrap();

        assert_eq!(
            matched(&router, Method::GET, "/api/users/man").as_deref(),
            Some("/api/users/man")
        );
        assert_eq!(
            matched(&router, Method::GET, "/api/users/bob").as_deref(),
            Some("/api/users/{name}")
        );
    }

    #[test]
    fn test_int_constraint_rejects_text() {
        let mut router = build_router(&[(Method::GET, "/api/users/{id:int}")]);
        router.compile().unwrap();

        assert!(matched(&router, Method::GET, "/api/users/12").is_some());
        assert!(matched(&router, Method::GET, "/api/users/notanumber").is_none());
        assert!(matched(&router, Method::POST, "/api/users/12").is_none());
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let mut router = build_router(&[(Method::GET, "/"), (Method::GET, "/api")]);
        router.compile().unwrap();

        assert_eq!(matched(&router, Method::GET, "/").as_deref(), Some("/"));
        assert_eq!(matched(&router, Method::GET, "/api").as_deref(), Some("/api"));
        assert_eq!(matched(&router, Method::GET, "/api/"), None);
        assert_eq!(matched(&router, Method::GET, "api"), None);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut router = build_router(&[(Method::GET, "/items"), (Method::GET, "/items")]);
        assert!(matches!(
            router.compile(),
            Err(RouteError::AlreadyRegistered { .. })
        ));

        let mut router = build_router(&[(Method::GET, "/items"), (Method::PUT, "/items")]);
        assert!(router.compile().is_ok());
    }

    #[test]
    fn test_failed_compile_keeps_buffered_endpoints() {
        let mut router = build_router(&[(Method::GET, "/a")]);
        router.compile().unwrap();

        router.add_endpoint(Endpoint::new(Method::GET, "/b", ok).unwrap());
        router.add_endpoint(Endpoint::new(Method::GET, "/a", ok).unwrap());
        assert!(matches!(
            router.compile(),
            Err(RouteError::AlreadyRegistered { .. })
        ));

        assert_eq!(router.endpoints().len(), 1);
        assert_eq!(router.pending_len(), 2);
        assert_eq!(matched(&router, Method::GET, "/a").as_deref(), Some("/a"));
        assert_eq!(matched(&router, Method::GET, "/b"), None);
    }

    #[test]
    fn test_compile_twice_keeps_earlier_routes() {
        let mut router = build_router(&[(Method::GET, "/a")]);
        router.compile().unwrap();
        router.add_endpoint(Endpoint::new(Method::GET, "/b", ok).unwrap());
        router.compile().unwrap();

        assert!(matched(&router, Method::GET, "/a").is_some());
        assert!(matched(&router, Method::GET, "/b").is_some());
        assert_eq!(router.endpoints().len(), 2);
    }
}
