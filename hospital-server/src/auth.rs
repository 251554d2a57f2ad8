use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use hospital_core::ApiResponse;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::session::Claims;
use crate::AppState;

/// Bearer-token middleware for tenant-scoped routes.
///
/// On success the verified [`Claims`] are inserted into request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let client_ip = client_ip(&request);

    let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
    else {
        log_auth_attempt(&client_ip, None, false);
        return Err(unauthorized("Missing or malformed Authorization header"));
    };

    let claims = match state.sessions.verify_session(token) {
        Ok(claims) => claims,
        Err(e) => return Err(rejection(e, &client_ip)),
    };

    log_auth_attempt(&client_ip, Some(claims.staff_id), true);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Token part of a `Bearer <token>` header value.
fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn client_ip(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Bad tokens are 401; anything else (store failures) keeps its own status.
fn rejection(err: ServiceError, client_ip: &str) -> Response {
    match err {
        ServiceError::InvalidToken(reason) => {
            tracing::debug!(reason = %reason, "Token rejected");
            log_auth_attempt(client_ip, None, false);
            unauthorized("Invalid token")
        }
        other => <(StatusCode, Json<Value>)>::from(other).into_response(),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiResponse::error(message))).into_response()
}

pub fn log_auth_attempt(client_ip: &str, staff_id: Option<i64>, success: bool) {
    if success {
        tracing::info!(
            staff_id = staff_id.unwrap_or_default(),
            client_ip = %client_ip,
            status = "success",
            "Authentication successful"
        );
    } else {
        tracing::warn!(
            client_ip = %client_ip,
            status = "failed",
            "Authentication failed"
        );
    }
}
