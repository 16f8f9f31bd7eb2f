//! Routing error types.

use thiserror::Error;

/// Errors raised while parsing route templates or compiling the routing tree.
///
/// All of these are configuration errors: they surface during startup and are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route template '{template}' must start with '/'")]
    MissingLeadingSlash { template: String },

    #[error("unknown constraint '{function}' in route segment '{segment}'")]
    UnknownConstraint { segment: String, function: String },

    #[error("invalid argument for constraint '{function}' in route segment '{segment}': {reason}")]
    InvalidArgument {
        segment: String,
        function: String,
        reason: String,
    },

    #[error("invalid regex in route segment '{segment}': {reason}")]
    InvalidRegex { segment: String, reason: String },

    #[error("endpoint {method} {template} is already registered")]
    AlreadyRegistered { method: String, template: String },
}
