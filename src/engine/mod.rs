//! Application engine subsystem.
//!
//! # Data Flow
//! ```text
//! Request (from http::server)
//!     → dispatch.rs (scope + Context, outermost error boundary)
//!     → middleware pipeline
//!         → RouterMiddleware     (routing data on the context)
//!         → EndpointsMiddleware  (authorizers, then endpoint.rs)
//!             → handler.rs       (binding.rs extracts arguments)
//!             → http::results    (return value into the response)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - One `Context` per request; it owns the request scope
//! - Handlers are plain async functions; arguments describe their inputs
//! - Binding failures are client errors (400), everything else is a 500

pub mod application;
pub mod binding;
pub mod context;
pub mod data;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod principal;

pub use application::{WebApplication, WebApplicationBuilder};
pub use binding::{
    Cookie, FromBody, FromContext, FromHeader, FromQuery, FromRoute, FromServices,
    FromServicesAll, ParamName, ParamValue, TraceId, Transient, TransientAll,
};
pub use context::{Context, RoutingData};
pub use data::DataContainer;
pub use dispatch::WebApplicationEngine;
pub use endpoint::{Action, AuthorizationResult, Authorizer, Endpoint};
pub use error::{BindingError, ParamSource, RequestError};
pub use handler::{Handler, WithContext};
pub use principal::{Claim, Identity, Principal};
