mod client;
mod config;
mod provisioning;
mod routes_composes;
mod state;
mod subscriptions;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::client::HttpImageBuilder;
use crate::config::AppConfig;
use crate::provisioning::CheckedWizard;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;
    let http = reqwest::Client::new();

    let api = Arc::new(HttpImageBuilder::new(cfg.image_builder_url.clone(), http.clone()));

    // wizard check runs in the background; rows render meanwhile
    let wizard = CheckedWizard::spawn(cfg.wizard_url.clone(), http);
    info!(
        provisioning = cfg.provisioning_enabled,
        permissions = ?cfg.permissions,
        "catalog: provisioning configured"
    );

    let app_state = Arc::new(AppState::new(cfg.clone(), api, wizard));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/composes", get(crate::routes_composes::list_composes))
        .route("/composes/:id", get(crate::routes_composes::get_compose))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = &cfg.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("catalog listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
