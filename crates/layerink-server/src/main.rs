//! LayerInk Service
//!
//! Stores uploaded images, segments them and renders exports.
//!
//! ## Endpoints
//!
//! - `POST /api/upload` (multipart `file`)
//! - `GET /api/upload/{id}/info`
//! - `GET /api/segments/{id}` and `GET /api/segments/{id}/status`
//! - `POST /api/export` and `GET /api/export/{id}/download`
//! - `GET /uploads/{file}`

mod compose;
mod config;
mod error;
mod routes;
mod segmenter;
mod state;

use std::sync::Arc;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "layerink_server=info,tower_http=info".into()),
        )
        .init();

    if let Err(err) = run().await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    config.ensure_dirs()?;
    let addr = config.bind;

    let state = Arc::new(AppState::new(config));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("LayerInk service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
