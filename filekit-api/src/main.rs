use anyhow::Context;
use clap::Parser;
use filekit_api::{app, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filekit_api=debug,filekit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();
    let state = AppState::from_config(&config)
        .await
        .with_context(|| format!("preparing data directory {}", config.data_dir.display()))?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;

    info!(
        bind = %config.bind,
        data_dir = %config.data_dir.display(),
        ffmpeg = %config.ffmpeg.display(),
        max_jobs = config.max_jobs,
        "filekit API listening on http://{}",
        config.bind
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}
