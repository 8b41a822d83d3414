//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orderflow::OrderFlowError;

/// API-level error that maps to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Request could not be authenticated (missing/invalid identity headers).
    Unauthorized(String),
    /// The identity lacks the required role.
    Forbidden,
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order flow error with its own status mapping.
    Flow(OrderFlowError),
    /// Internal server error; detail is logged, not returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "administrator role required".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Flow(err) => flow_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn flow_error_to_response(err: OrderFlowError) -> (StatusCode, String) {
    match &err {
        OrderFlowError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        // insufficient stock is an expected, recoverable condition: the
        // caller fixes quantities and resubmits
        OrderFlowError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderFlowError::ProductNotFound(_)
        | OrderFlowError::OrderNotFound(_)
        | OrderFlowError::ShipmentNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OrderFlowError::InvalidTransition { .. } | OrderFlowError::Conflict(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        OrderFlowError::Store(inner) => {
            tracing::error!(error = %inner, "storage fault");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<OrderFlowError> for ApiError {
    fn from(err: OrderFlowError) -> Self {
        ApiError::Flow(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Flow(OrderFlowError::from(err))
    }
}
