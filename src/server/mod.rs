pub mod handlers;
pub mod models;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{extract::Extension, http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::pipeline::RagPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stateless per request; history travels in the request body
    pub pipeline: Arc<RagPipeline>,
}

/// Build the full router for the given pipeline
pub fn app(pipeline: Arc<RagPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .nest("/api", routes::api_router())
        .route("/health", get(handlers::health_check))
        .layer(Extension(AppState { pipeline }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Run the HTTP server on the specified host and port
pub async fn run_server(pipeline: Arc<RagPipeline>, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("HTTP server starting on http://{}", addr);

    axum::Server::bind(&addr)
        .serve(app(pipeline).into_make_service())
        .await?;

    Ok(())
}
