use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/memes/random", get(handlers::get_random_meme))
        .route("/api/memes/create", post(handlers::generate_meme))
        .route("/api/memes/{id}", get(handlers::get_meme_by_id))
        // reaches ids that collide with the static routes above, e.g. "random"
        .route("/api/memes/by-id/{id}", get(handlers::get_meme_by_id))
        .route(
            "/api/memes/images/create/{template_id}",
            post(handlers::render_meme_image),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
