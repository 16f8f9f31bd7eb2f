//! Parsed inbound request.
//!
//! # Responsibilities
//! - Hold method, path, query, headers, cookies, body, version and scheme
//! - Parse the query string and cookies once, up front
//! - Percent-decode the path once for routing
//! - Convert from the transport's `http::Request<Bytes>`
//!
//! # Design Decisions
//! - Body is fully buffered (limit enforced by the transport)
//! - Header names are case-insensitive and multi-valued (`HeaderMap`)

use axum::body::Bytes;
use percent_encoding::percent_decode_str;
use axum::http::{self, header, HeaderMap, Method, Uri, Version};

use crate::http::params::Params;

/// Correlation header propagated through the stack.
pub const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    route_path: String,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    query: Params,
    cookies: Params,
    secure: bool,
}

impl Request {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = uri.query().map(Params::from_query).unwrap_or_default();
        let cookies = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Params::from_cookie_header)
            .collect();
        let secure = uri.scheme_str() == Some("https");
        let route_path = percent_decode_str(uri.path())
            .decode_utf8_lossy()
            .into_owned();

        Self {
            method,
            uri,
            route_path,
            version: Version::HTTP_11,
            headers,
            body,
            query,
            cookies,
            secure,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Mark the request as received over TLS.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Raw path as received.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Percent-decoded path used for routing and route parameters.
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn query(&self) -> &Params {
        &self.query
    }

    pub fn cookies(&self) -> &Params {
        &self.cookies
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn scheme(&self) -> &str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Request::new(parts.method, parts.uri, parts.headers, body).with_version(parts.version)
    }
}
