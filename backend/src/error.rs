// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrorsKind;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Validation failures on request DTOs.
/// A `payload_too_large` code anywhere in the report, nested posts included,
/// maps to 413, everything else to 400.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        if has_error_code(&errors, "payload_too_large") {
            AppError::PayloadTooLarge(errors.to_string())
        } else {
            AppError::BadRequest(errors.to_string())
        }
    }
}

fn has_error_code(errors: &validator::ValidationErrors, code: &str) -> bool {
    errors.errors().values().any(|kind| match kind {
        ValidationErrorsKind::Field(errs) => errs.iter().any(|e| e.code == code),
        ValidationErrorsKind::Struct(inner) => has_error_code(inner, code),
        ValidationErrorsKind::List(items) => items.values().any(|inner| has_error_code(inner, code)),
    })
}

/// Failures inside the rich-content pipeline.
///
/// These never reach an HTTP client: the normalizer catches them and degrades
/// to plain sanitization of the original input.
#[derive(Debug)]
pub enum RenderError {
    /// The fragment parser produced no root element.
    MissingRoot,

    /// Writing the serialized tree failed.
    Serialize(std::io::Error),

    /// The serializer emitted bytes that are not UTF-8.
    Encoding(std::string::FromUtf8Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingRoot => write!(f, "fragment parser returned no root element"),
            RenderError::Serialize(e) => write!(f, "failed to serialize html tree: {}", e),
            RenderError::Encoding(e) => write!(f, "serialized html is not utf-8: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Serialize(e) => Some(e),
            RenderError::Encoding(e) => Some(e),
            RenderError::MissingRoot => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Serialize(err)
    }
}

impl From<std::string::FromUtf8Error> for RenderError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RenderError::Encoding(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn field_error(code: &'static str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add("content", ValidationError::new(code));
        errors
    }

    #[test]
    fn oversized_nested_item_maps_to_413() {
        let mut outer = ValidationErrors::new();
        outer.errors_mut().insert(
            "posts".into(),
            ValidationErrorsKind::List([(3, Box::new(field_error("payload_too_large")))].into()),
        );
        assert!(matches!(AppError::from(outer), AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn other_validation_errors_map_to_400() {
        assert!(matches!(AppError::from(field_error("length")), AppError::BadRequest(_)));
    }
}
