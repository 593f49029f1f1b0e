mod config;
mod coordinator;
mod db;
mod errors;
mod history;
mod llm_client;
mod models;
mod render;
mod routes;
mod settings;
mod state;
mod store;
mod tailoring;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ProviderClient;
use crate::render::html::HtmlRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and the store
    let pool = db::create_pool(&config.database_url).await?;
    let store = Store::new(pool);

    // Initialize the LLM provider client
    let provider = ProviderClient::new();
    info!("LLM provider client initialized");

    // Spawn the render queue and the background coordinator
    let renderer = render::spawn_queue(Arc::new(HtmlRenderer));
    let coordinator = coordinator::spawn(store.clone(), provider, renderer);

    // Build app state
    let state = AppState { store, coordinator };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
