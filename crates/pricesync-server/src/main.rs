//! `pricesync-server` entry point.

use pricesync_server::{Config, app_router, build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let state = build_state(&config)?;
    let router = app_router(state, &config.cors_allow)?;

    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
