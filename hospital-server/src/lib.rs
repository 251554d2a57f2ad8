//! hospital-server - multi-tenant hospital patient lookup API
//!
//! Staff log in against their hospital and receive a token scoped to it.
//! Patient searches run only within that hospital, consulting the partner
//! registry first where an identifier is given.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod resolver;
pub mod seed;
pub mod session;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use hospital_store::SqliteStore;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::registry::PatientRegistry;
use crate::resolver::IdentityResolver;
use crate::session::SessionService;

/// Application state
pub struct AppState {
    pub config: config::ServerConfig,
    pub store: Arc<SqliteStore>,
    pub resolver: IdentityResolver,
    pub sessions: SessionService,
}

impl AppState {
    /// Wire the resolver and session service over one store.
    pub fn new(
        config: config::ServerConfig,
        store: Arc<SqliteStore>,
        registry: Arc<dyn PatientRegistry>,
    ) -> Self {
        let resolver = IdentityResolver::new(store.clone(), registry);
        let sessions = SessionService::new(store.clone(), &config.auth);
        Self {
            config,
            store,
            resolver,
            sessions,
        }
    }
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let patient_routes = Router::new()
        .route(
            "/api/v1/patient/search",
            get(handlers::patient::search_by_query).post(handlers::patient::search_by_body),
        )
        .route(
            "/api/v1/patient/search/{id}",
            get(handlers::patient::search_by_id),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/staff/create", post(handlers::staff::create_staff))
        .route("/api/v1/staff/login", post(handlers::staff::login))
        .merge(patient_routes)
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1MB
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
