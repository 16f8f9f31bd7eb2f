//! Lightweight web-service engine.
//!
//! Routes are compiled into a constraint-aware prefix tree, services are
//! resolved from a lifetime-aware container, and every request flows through
//! an explicit middleware chain that ends in a handler whose arguments are
//! bound from the request.

// Core subsystems
pub mod config;
pub mod di;
pub mod engine;
pub mod http;
pub mod middleware;
pub mod routing;

// Transport and process
pub mod lifecycle;
pub mod net;

// Cross-cutting concerns
pub mod observability;

pub use config::{Configuration, Environment, ServerSettings};
pub use di::{Injectable, ServiceCollection, ServiceProvider};
pub use engine::{Context, WebApplication, WebApplicationBuilder, WebApplicationEngine};
pub use http::{Json, Results};
pub use lifecycle::{Shutdown, StartupError};
