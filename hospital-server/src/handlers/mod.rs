pub mod health;
pub mod patient;
pub mod staff;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use hospital_core::ApiResponse;
use serde_json::Value;

use crate::error::ServiceError;

/// Error half of every handler result
pub type HandlerError = (StatusCode, Json<Value>);

/// Wrap `data` in a success envelope.
pub fn respond(status: StatusCode, message: &str, data: Value) -> Response {
    (status, Json(ApiResponse::ok(message, data))).into_response()
}

/// Error envelope without a service error behind it.
pub fn reject(status: StatusCode, message: impl Into<String>) -> HandlerError {
    let body = serde_json::to_value(ApiResponse::error(message)).unwrap_or_default();
    (status, Json(body))
}

/// Map a JSON body rejection onto the envelope instead of axum's plain text.
pub fn bad_body(rejection: JsonRejection) -> HandlerError {
    reject(StatusCode::BAD_REQUEST, format!("Invalid input: {}", rejection.body_text()))
}

/// Run password hashing work off the async workers.
pub async fn blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("Blocking task failed: {e}")))?
}
