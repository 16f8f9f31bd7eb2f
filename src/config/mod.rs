//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults, appsettings files, environment, CLI
//!     → loader.rs (ConfigurationBuilder merges the layers)
//!     → configuration.rs (key/value tree, `.`/`:` paths)
//!     → schema.rs (ServerSettings, Environment)
//!     → validation.rs (semantic checks)
//!     → registered as singletons for handlers and middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the application is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod configuration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use configuration::Configuration;
pub use loader::{ConfigError, ConfigurationBuilder};
pub use schema::{Environment, EnvironmentOptions, ServerSettings, TlsSettings};
pub use validation::{validate_settings, ValidationError};
