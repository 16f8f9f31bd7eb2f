//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Compile routes → Build services → Bind listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     First SIGTERM/SIGINT → graceful shutdown
//!     Second SIGTERM/SIGINT → immediate shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to an exit code
//! - Listeners start last (traffic only when ready)
//! - Shutdown has timeout: forced close after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownKind};
pub use startup::StartupError;
