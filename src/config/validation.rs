//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check listen URLs and that https listeners have TLS files configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerSettings → Result<(), Vec<ValidationError>>
//! - Runs before any listener is bound

use std::fmt;

use crate::config::schema::ServerSettings;
use crate::net::endpoint::ListenUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_settings(settings: &ServerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.timeout_sec == 0 {
        errors.push(ValidationError::new("timeoutSec", "must be greater than 0"));
    }
    if settings.body_limit == 0 {
        errors.push(ValidationError::new("bodyLimit", "must be greater than 0"));
    }

    let mut needs_tls = false;
    for url in &settings.urls {
        match ListenUrl::parse(url) {
            Ok(parsed) => needs_tls |= parsed.use_tls,
            Err(e) => errors.push(ValidationError::new("urls", e.to_string())),
        }
    }

    match &settings.tls {
        None if needs_tls => errors.push(ValidationError::new(
            "tls",
            "https urls require tls.certPath and tls.keyPath",
        )),
        Some(tls) if tls.cert_path.as_os_str().is_empty() => {
            errors.push(ValidationError::new("tls.certPath", "must not be empty"));
        }
        Some(tls) if tls.key_path.as_os_str().is_empty() => {
            errors.push(ValidationError::new("tls.keyPath", "must not be empty"));
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
