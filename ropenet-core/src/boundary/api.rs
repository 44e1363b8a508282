//! API routes definition

use super::handlers;
use crate::store::StoreHandle;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Build the API router with all endpoints
pub fn build_router(handle: StoreHandle) -> Router {
    Router::new()
        // Auth routes
        .route("/api/auth/login", post(handlers::login))
        // Note routes
        .route("/api/notes", get(handlers::list_notes).post(handlers::create_note))
        .route("/api/notes/:noteId/replies", post(handlers::create_reply))
        .route("/api/notes/:noteId/like", post(handlers::like_note))
        // Instance routes
        .route("/api/instances", get(handlers::list_instances))
        .layer(middleware::from_fn(handlers::track_duration))
        // State
        .with_state(handle)
}
