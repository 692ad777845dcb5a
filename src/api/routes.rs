use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Thread search
        .route("/v1/search/threads", get(handlers::search_threads))
        // Thread read models and ingestion
        .route("/v1/threads", post(handlers::create_thread))
        .route("/v1/threads/recent_active", get(handlers::recent_active_threads))
        .route("/v1/threads/:id", get(handlers::get_thread))
        .route("/v1/threads/:id/comments", post(handlers::create_comment))
        // User read models
        .route("/v1/users", post(handlers::create_user))
        .route("/v1/users/:user_id", get(handlers::get_user))
        .route("/v1/users/:user_id", put(handlers::update_user))
        .route(
            "/v1/users/:user_id/active_threads",
            get(handlers::user_active_threads),
        )
        // Add state
        .with_state(state)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
