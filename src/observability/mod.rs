//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (trace_id, method, path, ...)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → logging.rs (console and/or JSON sinks, per-sink levels)
//!     → Prometheus scrape endpoint when Metrics.Address is set
//! ```
//!
//! # Design Decisions
//! - Levels come from `Logging.LogLevel` and `Logging.<Provider>.LogLevel`
//! - `RUST_LOG` overrides configured levels when set
//! - Trace id (x-request-id) flows through every request log line
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogLevel, LoggingSettings};
