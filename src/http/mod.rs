pub mod dashboard;
pub mod state;
pub mod stream;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::serve_index))
        .route("/stream.mp3", get(stream::serve_stream))
        .route("/stream", get(stream::serve_stream))
        .route("/api/stats", get(dashboard::serve_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
