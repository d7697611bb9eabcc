// ABOUTME: HTTP server assembly for the analyze API
// ABOUTME: Builds the axum router with tracing, CORS, and body limit layers and serves it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server
//!
//! [`build_router`] wires routes and middleware; [`run`] binds the listener,
//! starts the rate limit sweeper, and serves until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::setup_cors;
use crate::resources::ServerResources;
use crate::routes::{AnalyzeRoutes, HealthRoutes};

/// Build the application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors);
    let body_limit = resources.config.max_upload_bytes;

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AnalyzeRoutes::routes(resources))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the address is invalid, the port cannot be bound, or
/// the server fails while running.
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", resources.config.host, resources.config.http_port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                resources.config.host, resources.config.http_port
            )
        })?;

    let sweeper = resources.orchestrator.rate_limiter().spawn_sweeper();
    let app = build_router(resources);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "FormAI server listening");
    info!("  GET  /health  - Liveness and model configuration");
    info!("  GET  /ready   - Readiness");
    info!("  GET  /analyze - Service info and limits");
    info!("  POST /analyze - Analyze a gym equipment photo");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error");

    sweeper.abort();
    info!("FormAI server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received, draining connections");
}
