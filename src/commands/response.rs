//! Response Envelope
//!
//! Mutations answer `{ "success": true, ... }`; every failure answers
//! `{ "success": false, "error": "<message>" }` with a matching status.

use axum::{
    body::Bytes,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::domain::DomainError;

/// A DomainError on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Storage(_) | DomainError::Mail(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = json!({ "success": false, "error": self.0.message() });
        (status, Json(body)).into_response()
    }
}

/// `{ "success": true }` plus the given fields
pub fn success(fields: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    if let Value::Object(extra) = fields {
        body.extend(extra);
    }
    Json(Value::Object(body))
}

/// Parse a JSON request body; malformed input is a validation failure
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(DomainError::validation("No data provided").into());
    }
    serde_json::from_slice(body).map_err(|e| DomainError::validation(format!("Invalid data: {}", e)).into())
}

/// Read endpoints must never be served from a cache
pub fn no_cache<T: IntoResponse>(inner: T) -> Response {
    let mut response = inner.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, must-revalidate"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(DomainError::validation("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(DomainError::not_found("x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(DomainError::Storage("x".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_success_merges_fields() {
        let Json(body) = success(json!({ "id": 7 }));
        assert_eq!(body, json!({ "success": true, "id": 7 }));
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = parse_body::<Value>(&Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err.0, DomainError::Validation(_)));
        let err = parse_body::<Value>(&Bytes::new()).unwrap_err();
        assert_eq!(err.0.message(), "No data provided");
    }
}
