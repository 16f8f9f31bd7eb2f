//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! configured URLs ("http://localhost:9090", "https://0.0.0.0:443")
//!     → endpoint.rs (parse, resolve host, default ports, dedupe)
//!     → tls.rs (load certificate + key for https listeners)
//!     → Hand off to http::server for binding
//! ```
//!
//! # Design Decisions
//! - `localhost` binds 127.0.0.1
//! - Duplicate URLs collapse into one listener
//! - TLS is optional and handled by axum-server (rustls)

pub mod endpoint;
pub mod tls;

pub use endpoint::{parse_listen_urls, ListenUrl, ListenUrlError};
