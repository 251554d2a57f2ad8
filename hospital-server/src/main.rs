//! hospital-server entry point

use hospital_store::SqliteStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hospital_server::{
    build_router,
    config::{LogFormat, LogSettings, ServerConfig},
    registry, seed, AppState,
};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    // Load configuration before logging so the log settings apply
    let loaded = ServerConfig::load(
        std::path::Path::new("config.yaml")
            .exists()
            .then_some("config.yaml"),
    );
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => {
            let mut config = ServerConfig::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
    };

    init_tracing(&config.log);

    tracing::info!("Starting hospital-server...");
    if let Ok(path) = dotenv {
        tracing::info!("Loaded environment from {}", path.display());
    }
    if let Err(e) = loaded {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }
    if config.auth.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set, tokens are signed with the built-in default secret");
    }

    // Create data directory
    if let Err(e) = std::fs::create_dir_all(&config.storage.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    let store = SqliteStore::open(config.database_path()).unwrap_or_else(|e| {
        tracing::error!("Failed to open store: {}", e);
        std::process::exit(1);
    });
    let store = Arc::new(store);

    if config.seed.demo_data
        && let Err(e) = seed::seed_demo_data(&store)
    {
        tracing::error!("Failed to seed demo data: {}", e);
        std::process::exit(1);
    }

    let registry = registry::from_settings(&config.registry);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState::new(config, store, registry));
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap_or_else(|e| {
        tracing::error!("Server error: {}", e);
    });

    tracing::info!("Server shut down gracefully");
}

/// Text or JSON output, filtered by `RUST_LOG` or the configured level
fn init_tracing(settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let (text, json) = match settings.format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
