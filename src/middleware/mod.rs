//! Middleware pipeline.
//!
//! # Data Flow
//! ```text
//! WebApplicationEngine::handle(ctx)
//!     → Pipeline::run(ctx)
//!     → creator[0].create(ctx) → middleware.invoke(ctx, next)
//!           → next.run(ctx) → creator[1] ... (user middleware)
//!           → RouterMiddleware     (match endpoint, fill route params)
//!           → EndpointsMiddleware  (authorize, run handler, or 404)
//!     ← post-processing runs as each invoke returns
//! ```
//!
//! # Design Decisions
//! - A fresh middleware instance per request; creators are shared
//! - `Next` is consumed by `run`, so continuation happens at most once
//! - Not calling `next` short-circuits the rest of the chain
//! - Router and Endpoints stages are implicit unless placed explicitly

pub mod chain;
pub mod creators;
pub mod endpoints;
pub mod router;

pub use chain::{Middleware, Next, Pipeline};
pub use creators::{FactoryCreator, FnCreator, MiddlewareCreator, MiddlewareCreators, TypeCreator};
pub use endpoints::EndpointsMiddleware;
pub use router::RouterMiddleware;
