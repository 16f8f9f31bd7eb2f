//! Routing stage.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::context::Context;
use crate::engine::error::RequestError;
use crate::middleware::chain::{Middleware, Next};
use crate::routing::Router;

/// Resolves the endpoint for the request and records it on the context.
/// Always continues; a miss leaves the routing data empty.
pub struct RouterMiddleware {
    router: Arc<dyn Router>,
}

impl RouterMiddleware {
    pub fn new(router: Arc<dyn Router>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Middleware for RouterMiddleware {
    async fn invoke(&mut self, ctx: &mut Context, next: Next<'_>) -> Result<(), RequestError> {
        let path = ctx.request().route_path().to_string();
        let method = ctx.request().method().clone();

        match self.router.match_route(&method, &path) {
            Some(endpoint) => {
                tracing::debug!(
                    trace_id = %ctx.trace_id(),
                    method = %method,
                    path = %path,
                    template = %endpoint.template(),
                    "Route matched"
                );
                ctx.routing_mut().set_endpoint(endpoint, &path);
            }
            None => {
                tracing::debug!(trace_id = %ctx.trace_id(), method = %method, path = %path, "No route matched");
            }
        }

        next.run(ctx).await
    }
}
