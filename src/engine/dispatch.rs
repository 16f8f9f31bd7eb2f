//! Request dispatch.
//!
//! # Responsibilities
//! - Open a service scope and a [`Context`] per request
//! - Run the middleware pipeline
//! - Convert every error and panic into a response
//! - Record request metrics
//!
//! # Design Decisions
//! - This is the outermost error boundary; `handle` never fails
//! - Client errors (400) carry their message; server errors are generic 500s
//!   with the diagnostic only in the log

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use futures_util::FutureExt;

use crate::di::ServiceProvider;
use crate::engine::context::Context;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::middleware::Pipeline;
use crate::observability::metrics;
use crate::routing::Router;

/// Compiled application: router, root services and middleware chain.
pub struct WebApplicationEngine {
    router: Arc<dyn Router>,
    services: ServiceProvider,
    pipeline: Pipeline,
}

impl WebApplicationEngine {
    pub fn new(router: Arc<dyn Router>, services: ServiceProvider, pipeline: Pipeline) -> Self {
        Self {
            router,
            services,
            pipeline,
        }
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// Root provider. Requests resolve through their own scope.
    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Serve one request.
    pub async fn handle(&self, request: Request) -> Response {
        let started = Instant::now();
        let method = request.method().clone();
        let mut ctx = Context::new(request, self.services.create_scoped());

        let outcome = AssertUnwindSafe(self.pipeline.run(&mut ctx))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_client_error() => {
                tracing::info!(
                    trace_id = %ctx.trace_id(),
                    path = %ctx.request().path(),
                    error = %e,
                    "Request rejected"
                );
                let response = ctx.response_mut();
                response.reset(e.status());
                response.set_text(e.to_string());
            }
            Ok(Err(e)) => {
                tracing::error!(
                    trace_id = %ctx.trace_id(),
                    method = %method,
                    path = %ctx.request().path(),
                    error = ?e,
                    "Request failed"
                );
                metrics::record_failure("error");
                ctx.response_mut().reset(e.status());
            }
            Err(panic) => {
                tracing::error!(
                    trace_id = %ctx.trace_id(),
                    method = %method,
                    path = %ctx.request().path(),
                    panic = %panic_message(panic.as_ref()),
                    "Request handler panicked"
                );
                metrics::record_failure("panic");
                ctx.response_mut().reset(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }

        let response = ctx.into_response();
        metrics::record_request(method.as_str(), response.status().as_u16(), started);
        response
    }
}

impl std::fmt::Debug for WebApplicationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApplicationEngine")
            .field("pipeline", &self.pipeline)
            .field("services", &self.services)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
