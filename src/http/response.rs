//! In-progress response.
//!
//! # Responsibilities
//! - Collect status, headers and body while the pipeline runs
//! - Typed setters for text and JSON bodies
//! - Convert into the transport's response type
//!
//! # Design Decisions
//! - Starts as `200 OK` with an empty body
//! - Body is buffered bytes; no streaming

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        let mut response = Self::new();
        response.status = status;
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replace every value of `name` with `value`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Set a body with the given content type.
    pub fn set_content(&mut self, content_type: &str, body: impl Into<Bytes>) {
        match HeaderValue::from_str(content_type) {
            Ok(value) => self.set_header(header::CONTENT_TYPE, value),
            Err(_) => {
                tracing::warn!(content_type = %content_type, "Invalid content type ignored");
            }
        }
        self.body = body.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.set_content(TEXT_PLAIN, text.into());
    }

    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.set_content(APPLICATION_JSON, body);
        Ok(())
    }

    /// Drop the body and headers set so far, keeping nothing but `status`.
    pub fn reset(&mut self, status: StatusCode) {
        *self = Self::with_status(status);
    }

    pub fn into_http(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
