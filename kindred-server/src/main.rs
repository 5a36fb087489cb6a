use kindred_server::{
    build_router,
    config::{ServerConfig, StoreBackend},
    services::{HttpIdentityProvider, KeyValueStore, MemoryStore, RedisStore},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration - fail fast if invalid
    let config = ServerConfig::from_env()?;

    kindred_core::observability::init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting kindred server"
    );

    let store: Arc<dyn KeyValueStore> = match config.store.backend {
        StoreBackend::Redis => Arc::new(RedisStore::new(&config.store.redis_url).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let identity = Arc::new(HttpIdentityProvider::new(config.identity.clone())?);
    tracing::info!(provider_url = %config.identity.url, "Identity provider adapter initialized");

    let state = AppState {
        config: config.clone(),
        identity,
        store,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
