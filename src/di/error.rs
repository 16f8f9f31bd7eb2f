//! Dependency injection errors.

use thiserror::Error;

use crate::di::service::Scope;

pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while registering or resolving services.
///
/// Every variant names the types involved.
#[derive(Debug, Error)]
pub enum DiError {
    #[error("service '{service}' is already registered for interface '{interface}'")]
    AlreadyRegistered {
        interface: &'static str,
        service: &'static str,
    },

    #[error("service '{service}' cannot be registered as {scope}: interface '{interface}' is already registered as {existing}")]
    ScopeMismatch {
        interface: &'static str,
        service: &'static str,
        scope: Scope,
        existing: Scope,
    },

    #[error("no service registered for interface '{interface}'")]
    NotRegistered { interface: &'static str },

    #[error("circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<&'static str> },

    #[error("service '{service}' for interface '{interface}' is transient and cannot be shared, use create_service")]
    TransientForbidden {
        interface: &'static str,
        service: &'static str,
    },

    #[error("interface '{interface}' is registered as {scope}, only transient services can be created")]
    NotTransient {
        interface: &'static str,
        scope: Scope,
    },

    #[error("failed to construct service '{service}': {source}")]
    Construction {
        service: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("interface '{interface}' is registered in both service collections")]
    MergeConflict { interface: &'static str },
}

impl DiError {
    /// Wrap a factory failure for service `T`.
    pub fn construction<T: ?Sized + 'static>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DiError::Construction {
            service: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}
