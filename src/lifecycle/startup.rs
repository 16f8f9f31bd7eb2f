//! Startup orchestration errors.
//!
//! # Responsibilities
//! - Classify everything that can stop the application from serving
//! - Map each class to a distinct process exit code
//!
//! # Exit Codes
//! ```text
//! 0  normal shutdown
//! 1  other runtime failure
//! 2  configuration error
//! 3  route error
//! 4  dependency injection error
//! 5  bind failure
//! 6  TLS failure
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use crate::di::DiError;
use crate::net::ListenUrlError;
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("listen url error: {0}")]
    ListenUrl(#[from] ListenUrlError),

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error("service error: {0}")]
    Services(#[from] DiError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load TLS certificate: {0}")]
    Tls(#[source] std::io::Error),

    #[error("runtime error: {0}")]
    Runtime(#[source] std::io::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Config(_) | StartupError::ListenUrl(_) => 2,
            StartupError::Route(_) => 3,
            StartupError::Services(_) => 4,
            StartupError::Bind { .. } => 5,
            StartupError::Tls(_) => 6,
            StartupError::Runtime(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            StartupError::Config(ConfigError::InvalidArgument("x".into())),
            StartupError::Route(RouteError::MissingLeadingSlash {
                template: "api".into(),
            }),
            StartupError::Services(DiError::NotRegistered { interface: "dyn Repo" }),
            StartupError::Bind {
                address: "127.0.0.1:80".into(),
                source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
            },
            StartupError::Tls(std::io::Error::from(std::io::ErrorKind::NotFound)),
            StartupError::Runtime(std::io::Error::other("boom")),
        ];
        let codes: Vec<i32> = errors.iter().map(StartupError::exit_code).collect();
        assert_eq!(codes, [2, 3, 4, 5, 6, 1]);
    }
}
