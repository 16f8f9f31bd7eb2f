//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, timeout, request ID, body limit)
//!     → request.rs (method, path, query, headers, cookies, body)
//!     → [engine runs the middleware pipeline]
//!     → results.rs (handler return value written into the response)
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod params;
pub mod request;
pub mod response;
pub mod results;
pub mod server;

pub use params::Params;
pub use request::{Request, X_REQUEST_ID};
pub use response::Response;
pub use results::{IntoResult, Json, Results};
pub use server::HttpServer;
