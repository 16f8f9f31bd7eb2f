//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to shutdown events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second SIGTERM/SIGINT forces immediate shutdown

use crate::lifecycle::shutdown::Shutdown;

/// Forward termination signals to `shutdown` until the second one arrives.
pub async fn listen_for_signals(shutdown: Shutdown) {
    if let Err(e) = wait_for_termination().await {
        tracing::error!(error = %e, "Failed to install signal handlers");
        return;
    }
    tracing::info!("Shutdown signal received, draining in-flight requests");
    shutdown.trigger();

    if let Err(e) = wait_for_termination().await {
        tracing::error!(error = %e, "Failed to install signal handlers");
        return;
    }
    tracing::warn!("Second shutdown signal received, closing immediately");
    shutdown.trigger_immediate();
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
