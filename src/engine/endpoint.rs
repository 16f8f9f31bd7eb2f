//! Registered endpoints.
//!
//! # Responsibilities
//! - Pair a method + route template with a handler action
//! - Hold the ordered authorizers checked before the action runs
//!
//! # Design Decisions
//! - Template parsing happens at registration; duplicates are a router concern
//! - Authorizers are synchronous and see the context read-only

use std::fmt;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::engine::context::Context;
use crate::engine::error::RequestError;
use crate::engine::handler::{Handler, HandlerAction};
use crate::routing::{RouteError, RouteTemplate};

/// Type-erased endpoint body.
pub trait Action: Send + Sync {
    fn execute<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizationResult {
    pub authorized: bool,
    pub reason: String,
}

impl AuthorizationResult {
    pub fn allow() -> Self {
        Self {
            authorized: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            authorized: false,
            reason: reason.into(),
        }
    }
}

/// Per-endpoint access check.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, ctx: &Context) -> AuthorizationResult;
}

impl<F> Authorizer for F
where
    F: Fn(&Context) -> AuthorizationResult + Send + Sync,
{
    fn authorize(&self, ctx: &Context) -> AuthorizationResult {
        self(ctx)
    }
}

pub struct Endpoint {
    method: Method,
    template: RouteTemplate,
    action: Box<dyn Action>,
    authorizers: Vec<Box<dyn Authorizer>>,
}

impl Endpoint {
    /// Build an endpoint from any [`Handler`]: an async fn of extractors or a
    /// sync fn taking `&mut Context`.
    pub fn new<H, Args>(method: Method, template: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self::from_action(method, template, HandlerAction::new(handler))
    }

    pub fn from_action(
        method: Method,
        template: &str,
        action: impl Action + 'static,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            method,
            template: RouteTemplate::parse(template)?,
            action: Box::new(action),
            authorizers: Vec::new(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn add_authorizer(&mut self, authorizer: impl Authorizer + 'static) -> &mut Self {
        self.authorizers.push(Box::new(authorizer));
        self
    }

    pub fn authorizers(&self) -> &[Box<dyn Authorizer>] {
        &self.authorizers
    }

    /// Run authorizers in order; the first refusal wins.
    pub fn authorize(&self, ctx: &Context) -> AuthorizationResult {
        self.authorizers
            .iter()
            .map(|a| a.authorize(ctx))
            .find(|result| !result.authorized)
            .unwrap_or_else(AuthorizationResult::allow)
    }

    pub fn execute<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), RequestError>> {
        self.action.execute(ctx)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("authorizers", &self.authorizers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{ServiceCollection, ServiceProvider};
    use crate::http::request::Request;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Uri};

    async fn ok() -> &'static str {
        "ok"
    }

    fn context() -> Context {
        let request = Request::new(Method::GET, Uri::from_static("/"), HeaderMap::new(), Bytes::new());
        Context::new(request, ServiceProvider::new(ServiceCollection::new()))
    }

    #[test]
    fn test_invalid_template_rejected() {
        assert!(matches!(
            Endpoint::new(Method::GET, "api", ok),
            Err(RouteError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_first_refusal_wins() {
        let mut endpoint = Endpoint::new(Method::GET, "/admin", ok).unwrap();
        endpoint
            .add_authorizer(|_: &Context| AuthorizationResult::allow())
            .add_authorizer(|_: &Context| AuthorizationResult::deny("admins only"))
            .add_authorizer(|_: &Context| AuthorizationResult::deny("never reached"));

        let result = endpoint.authorize(&context());
        assert!(!result.authorized);
        assert_eq!(result.reason, "admins only");
    }

    #[test]
    fn test_no_authorizers_allows() {
        let endpoint = Endpoint::new(Method::GET, "/", ok).unwrap();
        assert!(endpoint.authorize(&context()).authorized);
    }

    #[tokio::test]
    async fn test_execute_writes_response() {
        let endpoint = Endpoint::new(Method::GET, "/", ok).unwrap();
        let mut ctx = context();
        endpoint.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body().as_ref(), b"ok");
    }
}
