//! Endpoint stage: authorization and handler execution.

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::engine::context::Context;
use crate::engine::error::RequestError;
use crate::http::response::TEXT_PLAIN;
use crate::middleware::chain::{Middleware, Next};

/// Runs the matched endpoint. Without a match the response becomes 404 and
/// the chain continues, so later middleware may still answer.
#[derive(Debug, Default)]
pub struct EndpointsMiddleware;

#[async_trait]
impl Middleware for EndpointsMiddleware {
    async fn invoke(&mut self, ctx: &mut Context, next: Next<'_>) -> Result<(), RequestError> {
        let Some(endpoint) = ctx.routing().endpoint().cloned() else {
            ctx.response_mut().set_status(StatusCode::NOT_FOUND);
            return next.run(ctx).await;
        };

        let decision = endpoint.authorize(ctx);
        if !decision.authorized {
            tracing::info!(
                trace_id = %ctx.trace_id(),
                template = %endpoint.template(),
                reason = %decision.reason,
                "Request not authorized"
            );
            let response = ctx.response_mut();
            response.set_status(StatusCode::FORBIDDEN);
            if !decision.reason.is_empty() {
                response.set_content(TEXT_PLAIN, decision.reason);
            }
            return Ok(());
        }

        endpoint.execute(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::di::{ServiceCollection, ServiceProvider};
    use crate::engine::endpoint::{AuthorizationResult, Endpoint};
    use crate::http::request::Request;
    use crate::middleware::chain::Pipeline;
    use crate::middleware::creators::TypeCreator;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, Uri};

    async fn hello() -> &'static str {
        "hello"
    }

    fn context() -> Context {
        let request = Request::new(Method::GET, Uri::from_static("/hello"), HeaderMap::new(), Bytes::new());
        Context::new(request, ServiceProvider::new(ServiceCollection::new()))
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(vec![Arc::new(TypeCreator::<EndpointsMiddleware>::new())])
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_not_found() {
        let mut ctx = context();
        pipeline().run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_runs_authorized_endpoint() {
        let mut ctx = context();
        let endpoint = Arc::new(Endpoint::new(Method::GET, "/hello", hello).unwrap());
        ctx.routing_mut().set_endpoint(endpoint, "/hello");

        pipeline().run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_refusal_is_forbidden_with_reason() {
        let mut ctx = context();
        let mut endpoint = Endpoint::new(Method::GET, "/hello", hello).unwrap();
        endpoint.add_authorizer(|_: &Context| AuthorizationResult::deny("members only"));
        ctx.routing_mut().set_endpoint(Arc::new(endpoint), "/hello");

        pipeline().run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::FORBIDDEN);
        assert_eq!(ctx.response().body().as_ref(), b"members only");
    }
}
