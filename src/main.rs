//! rest-engine demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum-server, timeout, request id, body limit)
//!                        │
//!                        ▼
//!                     engine::dispatch (scope + Context, error boundary)
//!                        │
//!                        ▼
//!                     middleware chain ──▶ RouterMiddleware ──▶ EndpointsMiddleware
//!                        │                    (routing tree)       (authorizers, handler)
//!                        ▼
//!     Client Response ◀── http::response
//!
//!     Cross-cutting: config (layered settings), di (service lifetimes),
//!                    observability (tracing, metrics), lifecycle (signals, exit codes)
//! ```
//!
//! Usage: `rest-engine [--environment NAME] [--content-root DIR] [key=value ...]`

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use rest_engine::config::EnvironmentOptions;
use rest_engine::di::{DiResult, Injectable, ServiceProvider};
use rest_engine::engine::{AuthorizationResult, Context, FromRoute, FromServices, TraceId};
use rest_engine::http::{Json, Results};
use rest_engine::{implements, param_names, StartupError, WebApplication};

#[derive(Parser)]
#[command(name = "rest-engine")]
#[command(about = "Demo service built on the rest-engine framework", long_about = None)]
struct Cli {
    /// Environment name (development, staging, production, ...)
    #[arg(short, long)]
    environment: Option<String>,

    /// Directory holding appsettings files
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Configuration overrides, e.g. `urls=http://0.0.0.0:8080 timeoutSec=10`
    overrides: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u32,
    name: String,
}

trait UserRepository: Send + Sync {
    fn find(&self, id: u32) -> Option<User>;
}

struct InMemoryUsers {
    users: Vec<User>,
}

impl Injectable for InMemoryUsers {
    fn inject(_: &ServiceProvider) -> DiResult<Self> {
        Ok(Self {
            users: vec![
                User { id: 1, name: "Ada".into() },
                User { id: 12, name: "Grace".into() },
            ],
        })
    }
}

impl UserRepository for InMemoryUsers {
    fn find(&self, id: u32) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }
}

implements!(InMemoryUsers => dyn UserRepository);

/// Requests served since startup.
#[derive(Default)]
struct RequestCounter(AtomicU64);

param_names!(Id => "id");

async fn get_user(
    id: FromRoute<Id, u32>,
    users: FromServices<dyn UserRepository>,
    trace: TraceId,
) -> Result<Results, serde_json::Error> {
    match users.find(*id) {
        Some(user) => {
            tracing::debug!(trace_id = %trace.0, id = user.id, "User found");
            Results::ok(&user)
        }
        None => Ok(Results::NotFound),
    }
}

async fn stats(counter: Arc<RequestCounter>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "served": counter.0.load(Ordering::Relaxed) }))
}

fn start(cli: Cli) -> Result<(), StartupError> {
    let options = EnvironmentOptions {
        environment_name: cli.environment,
        content_root_path: cli.content_root,
        ..Default::default()
    };

    let mut builder = WebApplication::builder()
        .with_options(options)
        .with_args(cli.overrides)?;
    builder
        .services()
        .add_singleton::<dyn UserRepository, InMemoryUsers>()?
        .add_singleton_with::<RequestCounter, RequestCounter, _>(|_| Ok(RequestCounter::default()))?;

    let mut app = builder.build()?;

    app.use_fn(|ctx, next| {
        Box::pin(async move {
            if let Ok(counter) = ctx.services().get_required_service::<RequestCounter>() {
                counter.0.fetch_add(1, Ordering::Relaxed);
            }
            next.run(ctx).await
        })
    });

    app.map_get("/api/users/{id:int}", get_user)?;
    app.map_get("/api/stats", stats)?
        .add_authorizer(|ctx: &Context| {
            if ctx.request().header("x-api-key").is_some() {
                AuthorizationResult::allow()
            } else {
                AuthorizationResult::deny("x-api-key header required")
            }
        });

    app.run()
}

fn main() {
    if let Err(e) = start(Cli::parse()) {
        eprintln!("rest-engine: {}", e);
        std::process::exit(e.exit_code());
    }
}
