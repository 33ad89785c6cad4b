//! Life Canvas Flow API server binary.

use clap::Parser;
use lcf_server::config::Config;
use lcf_server::store::MemoryStore;
use lcf_server::{AppState, build_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let store = match &config.data_file {
        Some(path) => MemoryStore::open(path)?,
        None => {
            log::warn!("no data file configured; diagrams are kept in memory only");
            MemoryStore::new()
        }
    };

    let app = build_router(AppState::new(store));
    let listener = TcpListener::bind(config.addr).await?;
    log::info!("Life Canvas Flow API listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
    }
}
