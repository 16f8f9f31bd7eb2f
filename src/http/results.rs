//! Handler return values.
//!
//! Anything a handler returns implements [`IntoResult`], which writes it into
//! the in-progress [`Response`].
//!
//! | Return type              | Response                                   |
//! |--------------------------|--------------------------------------------|
//! | `String` / `&'static str` | 200, `text/plain`                         |
//! | `Json<T>`                | 200, `application/json`                    |
//! | `StatusCode`             | that status, empty body                    |
//! | `()`                     | untouched (200 unless middleware changed it) |
//! | `(StatusCode, R)`        | `R`, then the status                       |
//! | `Results`                | see the variants                           |
//! | `Result<R, E>`           | `R`, or a handler error (500)              |

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::engine::error::RequestError;
use crate::http::response::{Response, TEXT_PLAIN};

pub trait IntoResult {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError>;
}

/// Serialize the wrapped value as the JSON body.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// Prebuilt results.
#[derive(Debug, Clone, PartialEq)]
pub enum Results {
    /// 200 with a JSON body.
    Ok(Value),
    Json(Value, StatusCode),
    /// 200 with an explicit content type.
    Text { body: String, content_type: String },
    Status(StatusCode),
    NotFound,
    BadRequest(String),
    NoContent,
}

impl Results {
    pub fn ok<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Ok(serde_json::to_value(value)?))
    }

    pub fn json<T: Serialize>(value: &T, status: StatusCode) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?, status))
    }

    pub fn text(body: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::Text {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

impl IntoResult for Results {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        match self {
            Results::Ok(value) => {
                response.set_status(StatusCode::OK);
                response.set_json(&value)?;
            }
            Results::Json(value, status) => {
                response.set_status(status);
                response.set_json(&value)?;
            }
            Results::Text { body, content_type } => {
                response.set_status(StatusCode::OK);
                response.set_content(&content_type, body);
            }
            Results::Status(status) => response.set_status(status),
            Results::NotFound => response.set_status(StatusCode::NOT_FOUND),
            Results::BadRequest(reason) => {
                response.set_status(StatusCode::BAD_REQUEST);
                if !reason.is_empty() {
                    response.set_content(TEXT_PLAIN, reason);
                }
            }
            Results::NoContent => response.set_status(StatusCode::NO_CONTENT),
        }
        Ok(())
    }
}

impl IntoResult for String {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        response.set_text(self);
        Ok(())
    }
}

impl IntoResult for &'static str {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        response.set_text(self);
        Ok(())
    }
}

impl<T: Serialize> IntoResult for Json<T> {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        response.set_json(&self.0)?;
        Ok(())
    }
}

impl IntoResult for StatusCode {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        response.set_status(self);
        Ok(())
    }
}

impl IntoResult for () {
    fn write_to(self, _: &mut Response) -> Result<(), RequestError> {
        Ok(())
    }
}

impl<R: IntoResult> IntoResult for (StatusCode, R) {
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        self.1.write_to(response)?;
        response.set_status(self.0);
        Ok(())
    }
}

impl<R, E> IntoResult for Result<R, E>
where
    R: IntoResult,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn write_to(self, response: &mut Response) -> Result<(), RequestError> {
        match self {
            Ok(result) => result.write_to(response),
            Err(e) => Err(RequestError::Handler(e.into())),
        }
    }
}
