// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use embeddings_service::{load_embedder, start_server, AppState, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::parse();
    config.validate()?;
    let addr = config.socket_addr()?;

    info!(
        "Starting embeddings service (backend: {:?}, model: {})",
        config.backend, config.model_name
    );

    // The model must be ready before the listener accepts traffic
    let embedder = load_embedder(&config).await?;
    let state = AppState::new(embedder);

    start_server(addr, state).await
}
