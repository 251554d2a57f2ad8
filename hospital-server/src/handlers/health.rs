use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

use super::HandlerError;
use crate::AppState;

/// Health check (GET /health)
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Response, HandlerError> {
    let counts = state.store.counts().map_err(crate::error::ServiceError::from)?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "hospitals": counts.hospitals,
        "staff": counts.staff,
        "patients": counts.patients,
    }))
    .into_response())
}
