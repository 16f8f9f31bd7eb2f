//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback into the engine
//! - Wire up transport middleware (timeout, request ID, tracing)
//! - Enforce the request body limit while buffering
//! - Bind every listen URL, plain or TLS, and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{self, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use axum_server::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerSettings;
use crate::engine::WebApplicationEngine;
use crate::http::request::Request;
use crate::lifecycle::{Shutdown, ShutdownKind, StartupError};
use crate::net::{parse_listen_urls, tls, ListenUrl};

/// Per-listener state handed to the fallback handler.
#[derive(Clone)]
struct DispatchState {
    engine: Arc<WebApplicationEngine>,
    body_limit: usize,
    secure: bool,
}

/// Transport adapter between axum-server and the engine.
pub struct HttpServer {
    engine: Arc<WebApplicationEngine>,
    settings: ServerSettings,
}

impl HttpServer {
    pub fn new(engine: Arc<WebApplicationEngine>, settings: ServerSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self, secure: bool) -> Router {
        let state = DispatchState {
            engine: Arc::clone(&self.engine),
            body_limit: self.settings.body_limit,
            secure,
        };

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(self.settings.timeout_sec)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind every configured URL and serve until `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let urls = parse_listen_urls(&self.settings.urls)?;
        let tls_config = if urls.iter().any(|url| url.use_tls) {
            tls::load_from_settings(self.settings.tls.as_ref())
                .await
                .map_err(StartupError::Tls)?
        } else {
            None
        };

        let handle = Handle::new();
        let mut servers = JoinSet::new();

        for url in &urls {
            let listener = bind(url)?;
            let app = self.build_router(url.use_tls).into_make_service();

            if url.use_tls {
                let Some(config) = tls_config.clone() else {
                    return Err(StartupError::Tls(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no TLS certificate configured for {}", url),
                    )));
                };
                let server = axum_server::from_tcp_rustls(listener, config)
                    .handle(handle.clone());
                servers.spawn(async move { server.serve(app).await });
            } else {
                let server = axum_server::from_tcp(listener).handle(handle.clone());
                servers.spawn(async move { server.serve(app).await });
            }

            tracing::info!(url = %url, "Now listening");
        }

        let grace = Duration::from_secs(self.settings.shutdown_grace_sec);
        tokio::spawn(watch_shutdown(shutdown.subscribe(), handle, grace));

        let mut result = Ok(());
        while let Some(joined) = servers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Listener failed");
                    result = Err(StartupError::Runtime(e));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Listener task aborted");
                    result = Err(StartupError::Runtime(std::io::Error::other(e)));
                }
            }
        }

        tracing::info!("HTTP server stopped");
        result
    }
}

fn bind(url: &ListenUrl) -> Result<std::net::TcpListener, StartupError> {
    let addr = url.socket_addr()?;
    let bind_error = |source| StartupError::Bind {
        address: addr.to_string(),
        source,
    };

    let listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
    listener.set_nonblocking(true).map_err(bind_error)?;
    Ok(listener)
}

/// Translate shutdown events into server handle calls.
async fn watch_shutdown(
    mut events: broadcast::Receiver<ShutdownKind>,
    handle: Handle,
    grace: Duration,
) {
    while let Ok(kind) = events.recv().await {
        match kind {
            ShutdownKind::Graceful => {
                tracing::info!(grace_secs = grace.as_secs(), "Stopping listeners, draining connections");
                handle.graceful_shutdown(Some(grace));
            }
            ShutdownKind::Immediate => {
                tracing::warn!("Closing all connections");
                handle.shutdown();
                return;
            }
        }
    }
}

/// Fallback handler: buffer the body and hand the request to the engine.
async fn dispatch(State(state): State<DispatchState>, request: http::Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = state.body_limit,
                error = %e,
                "Request body rejected"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = Request::from(http::Request::from_parts(parts, body)).with_secure(state.secure);
    state.engine.handle(request).await.into_http()
}
