use kakou_service::{
    build_router,
    config::KakouConfig,
    services::{
        connect_pool, Database, KakouDatabase, LookupTables, MemoryCache, RedisCache,
        VerificationCache,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::spawn_limiter_pruning;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Fail fast on invalid configuration
    let config = KakouConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    kakou_service::services::metrics::init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting kakou service"
    );

    tracing::info!("Initializing database connections");
    let account_pool = connect_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    let kakou_pool = if config.database.kakou_url == config.database.url {
        account_pool.clone()
    } else {
        connect_pool(
            &config.database.kakou_url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?
    };

    let cache: Arc<dyn VerificationCache> = match &config.redis {
        Some(redis) => {
            let cache = RedisCache::new(&redis.url)
                .await
                .map_err(AppError::ConfigError)?;
            tracing::info!("Verification cache backed by Redis");
            Arc::new(cache)
        }
        None => {
            tracing::info!("Verification cache held in process");
            Arc::new(MemoryCache::new())
        }
    };

    let tables = match &config.lookup_tables_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading lookup tables");
            LookupTables::from_file(path)?
        }
        None => LookupTables::default(),
    };

    let state = AppState::new(
        config.clone(),
        Arc::new(Database::new(account_pool)),
        Arc::new(KakouDatabase::new(kakou_pool)),
        cache,
        tables,
    )?;
    tracing::info!(
        kakou_auth_required = config.auth.kakou_auth_required,
        allowlist_enabled = config.security.allowlist.is_enabled(),
        trusted_proxies = !config.security.trusted_proxies.is_empty(),
        "Application state initialized"
    );

    spawn_limiter_pruning(
        vec![
            state.account_rate_limiter.clone(),
            state.kakou_rate_limiter.clone(),
        ],
        Duration::from_secs(config.rate_limit.prune_interval_seconds),
    );

    let app = build_router(state);

    let addr = config.common.listen_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
