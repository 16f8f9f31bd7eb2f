//! Per-request errors.
//!
//! Everything that can go wrong between routing and writing the response is a
//! [`RequestError`]. The engine turns it into a status code at the outermost
//! boundary; nothing escapes to the transport.

use axum::http::StatusCode;
use thiserror::Error;

use crate::di::DiError;

/// Where a bound parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Route,
    Query,
    Header,
    Cookie,
}

impl std::fmt::Display for ParamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamSource::Route => "route",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

/// Malformed client input. Always a 400.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("missing required {location} parameter '{name}'")]
    Missing {
        location: ParamSource,
        name: &'static str,
    },

    #[error("{location} parameter '{name}' has invalid value '{value}', expected {expected}")]
    Invalid {
        location: ParamSource,
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid JSON body: {0}")]
    Body(#[source] serde_json::Error),

    #[error("request body is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("service resolution failed: {0}")]
    Service(#[from] DiError),

    #[error("handler failed: {0}")]
    Handler(Box<dyn std::error::Error + Send + Sync>),

    #[error("response serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RequestError {
    /// Wrap an arbitrary failure raised by handler or middleware code.
    pub fn handler(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RequestError::Handler(error.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Binding(_) => StatusCode::BAD_REQUEST,
            RequestError::Service(_)
            | RequestError::Handler(_)
            | RequestError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is safe to echo back to the client.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing: RequestError = BindingError::Missing {
            location: ParamSource::Query,
            name: "page",
        }
        .into();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert!(missing.is_client_error());
        assert_eq!(missing.to_string(), "missing required query parameter 'page'");

        let service: RequestError = DiError::NotRegistered { interface: "dyn Repo" }.into();
        assert_eq!(service.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let handler = RequestError::handler("boom");
        assert_eq!(handler.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!handler.is_client_error());
    }

    #[test]
    fn test_invalid_message_names_parameter() {
        let error = BindingError::Invalid {
            location: ParamSource::Route,
            name: "id",
            value: "abc".into(),
            expected: "i64",
        };
        assert_eq!(
            error.to_string(),
            "route parameter 'id' has invalid value 'abc', expected i64"
        );
    }
}
