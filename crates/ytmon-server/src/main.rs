mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use ytmon_ingest::{HubClient, MetadataFetcher, NotificationPipeline, YtDlpExtractor};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ytmon_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let auth = AuthState::from_config(
        config.api_key.as_deref(),
        matches!(config.env, ytmon_core::Environment::Development),
    )?;
    let channels = Arc::new(ytmon_core::load_channels(&config.channels_path)?);

    let pool_config = ytmon_db::PoolConfig::from_app_config(&config);
    let pool = ytmon_db::connect_pool(config.database_url()?, pool_config).await?;
    let applied = ytmon_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let store: Arc<dyn ytmon_core::VideoStore> = Arc::new(ytmon_db::PgVideoStore::new(
        pool,
        Duration::from_secs(config.db_statement_timeout_secs),
    ));
    let extractor = Arc::new(YtDlpExtractor::from_app_config(&config));
    let pipeline = NotificationPipeline::new(
        MetadataFetcher::new(extractor),
        Arc::clone(&store),
        config.max_concurrent_fetches,
    );
    let hub = HubClient::from_app_config(&config)?;

    let app = build_app(
        AppState {
            store,
            pipeline,
            hub,
            channels: Arc::clone(&channels),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        channels = channels.channels.len(),
        "ytmon-server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
