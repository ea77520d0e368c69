use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Field name to the list of messages reported against it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("category not found: {0}")]
    CategoryNotFound(i64),
    #[error("blog not found: {0}")]
    BlogNotFound(i64),
    #[error("not found: {0}")]
    InvalidId(String),
    #[error("validation error")]
    Validation(FieldErrors),
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        DomainError::Validation(errors)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::CategoryNotFound(_)
            | DomainError::BlogNotFound(_)
            | DomainError::InvalidId(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) | DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DomainError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DomainError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::CategoryNotFound(resource) | DomainError::BlogNotFound(resource) => {
                Some(json!({ "resource": resource }))
            }
            DomainError::Validation(fields) => Some(json!(fields)),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn validation_error_lists_offending_fields() {
        let err = DomainError::field("title", "This field is required.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "validation error");
        assert_eq!(value["details"]["title"][0], "This field is required.");
    }

    #[actix_web::test]
    async fn not_found_carries_resource_id() {
        let err = DomainError::BlogNotFound(7);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["details"]["resource"], 7);
    }

    #[test]
    fn storage_failures_are_internal() {
        let err = DomainError::Internal("connection reset".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
