//! Service-level errors and their HTTP mapping.

use axum::{http::StatusCode, response::Json};
use hospital_core::{ApiResponse, CoreError};
use hospital_store::StoreError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unknown username and wrong password both land here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Core(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidCredentials | ServiceError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Hashing(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the client.
    fn public_message(&self) -> String {
        match self {
            ServiceError::Core(e) => e.to_string(),
            ServiceError::Store(StoreError::NotFound { entity, key }) => {
                format!("{entity} not found: {key}")
            }
            ServiceError::Store(StoreError::Conflict { entity, .. }) => {
                format!("{entity} already exists")
            }
            ServiceError::InvalidCredentials => "Invalid credentials".to_string(),
            ServiceError::InvalidToken(_) => "Invalid token".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<ServiceError> for (StatusCode, Json<Value>) {
    fn from(err: ServiceError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::debug!(error = %err, status = %status, "Request rejected");
        }
        (status, Json(json!(ApiResponse::error(err.public_message()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::from(CoreError::EmptyFilter).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(StoreError::NotFound {
                entity: "hospital",
                key: "x".to_string()
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::from(StoreError::Conflict {
                entity: "staff",
                detail: "UNIQUE constraint failed: staff.username".to_string()
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ServiceError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServiceError::InvalidToken("expired".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Store(StoreError::Other("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_hides_internal_details() {
        let (status, Json(body)) =
            <(StatusCode, Json<Value>)>::from(ServiceError::Internal("db path /secret".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");

        let (_, Json(body)) = <(StatusCode, Json<Value>)>::from(ServiceError::Store(
            StoreError::Conflict {
                entity: "staff",
                detail: "UNIQUE constraint failed: staff.username".to_string(),
            },
        ));
        assert_eq!(body["error"], "staff already exists");
    }

    #[test]
    fn test_token_reason_not_echoed() {
        let (_, Json(body)) =
            <(StatusCode, Json<Value>)>::from(ServiceError::InvalidToken("ExpiredSignature".to_string()));
        assert_eq!(body["error"], "Invalid token");
    }
}
