use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    Extension,
};
use hospital_core::SearchFilters;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::{bad_body, reject, respond, HandlerError};
use crate::session::Claims;
use crate::AppState;

/// Search one patient by national id or passport id (GET /api/v1/patient/search/{id})
pub async fn search_by_id(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Response, HandlerError> {
    let patient = state
        .resolver
        .resolve_by_id(claims.hospital_id, &id)
        .await?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Patient not found"))?;

    Ok(respond(StatusCode::OK, "Patient found", json!(patient)))
}

/// Search patients by query-string filters (GET /api/v1/patient/search?...)
pub async fn search_by_query(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    search(&state, &claims, &params).await
}

/// Search patients by a JSON filter object (POST /api/v1/patient/search)
pub async fn search_by_body(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<HashMap<String, String>>, JsonRejection>,
) -> Result<Response, HandlerError> {
    let Json(params) = payload.map_err(bad_body)?;
    search(&state, &claims, &params).await
}

async fn search(
    state: &AppState,
    claims: &Claims,
    params: &HashMap<String, String>,
) -> Result<Response, HandlerError> {
    let filters = SearchFilters::from_map(params).map_err(crate::error::ServiceError::from)?;

    let patients = state
        .resolver
        .resolve_by_filters(claims.hospital_id, &filters)
        .await?;

    if patients.is_empty() {
        return Err(reject(
            StatusCode::NOT_FOUND,
            "No patients found matching the criteria",
        ));
    }

    Ok(respond(
        StatusCode::OK,
        "Patients found",
        json!({ "count": patients.len(), "patients": patients }),
    ))
}
