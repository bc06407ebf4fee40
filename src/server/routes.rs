use axum::{routing::post, Router};

use crate::server::handlers;

/// Create the API router
pub fn api_router() -> Router {
    Router::new()
        .route("/ask", post(handlers::ask))
        .route("/cypher", post(handlers::cypher))
}
