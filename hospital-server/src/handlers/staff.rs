use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{bad_body, blocking, respond, HandlerError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub hospital_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Create staff (POST /api/v1/staff/create)
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateStaffRequest>, JsonRejection>,
) -> Result<Response, HandlerError> {
    let Json(req) = payload.map_err(bad_body)?;

    let staff = blocking(move || {
        state
            .sessions
            .create_staff(&req.username, &req.password, &req.hospital_name)
    })
    .await?;

    Ok(respond(
        StatusCode::CREATED,
        "Staff created successfully",
        json!({ "staff_id": staff.id }),
    ))
}

/// Log in (POST /api/v1/staff/login)
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, HandlerError> {
    let Json(req) = payload.map_err(bad_body)?;

    let token = blocking(move || state.sessions.login(&req.username, &req.password)).await?;

    Ok(respond(StatusCode::OK, "Login successful", json!({ "token": token })))
}
