//! Dependency injection subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup):
//!     add_singleton / add_scoped / add_transient::<I, T>()
//!     → collection.rs (group creators per interface, enforce one scope)
//!
//! Resolution (per request):
//!     root ServiceProvider ──create_scoped()──▶ scoped ServiceProvider
//!     get_service::<I>()
//!         → singleton cache → scoped cache → main creator
//!         → guard.rs (cycle detection) → construct → cache
//!     create_service::<I>()
//!         → transient creator → owned Box<I> for the caller
//! ```
//!
//! # Design Decisions
//! - Container owns singletons and scoped services (`Arc<I>`)
//! - Caller owns transients (`Box<I>`), they are never cached
//! - Constructors are declared with [`Injectable`] or a factory closure
//! - Singleton construction is serialized; at most one instance per interface
//! - The last registered implementation is the main one

pub mod collection;
pub mod container;
pub mod error;
pub mod guard;
pub mod provider;
pub mod service;

pub use collection::ServiceCollection;
pub use error::{DiError, DiResult};
pub use provider::ServiceProvider;
pub use service::{Implements, Injectable, Scope, TypeKey};
