//! API route definitions

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Conversation endpoints
        .route("/invoke", post(handlers::invoke))
        .route("/stream", post(handlers::stream))
        .route("/count_conversations", get(handlers::count_conversations))
        .route("/delete", delete(handlers::delete_conversation))
        .with_state(state)
}
