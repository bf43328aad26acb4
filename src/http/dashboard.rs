use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::analytics::{compute_snapshot, AnalyticsSnapshot};
use crate::http::state::AppState;
use crate::playlist::mime::STREAM_MIME;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub now_playing: String,
    #[serde(flatten)]
    pub snapshot: AnalyticsSnapshot,
}

/// GET /api/stats — live statistics plus the shared now-playing label.
/// Always 200: a stopped listener log reads as empty and yields zeroed stats.
pub async fn serve_stats(State(state): State<AppState>) -> Response {
    let events = state.registry.events().await;
    let snapshot = compute_snapshot(&events, &chrono::Local::now(), state.current_window);
    Json(DashboardStats {
        now_playing: state.engine.now_playing().current().to_string(),
        snapshot,
    })
    .into_response()
}

/// GET / — bare player page pointing at the stream.
pub async fn serve_index(State(state): State<AppState>) -> Html<String> {
    let now_playing = state.engine.now_playing().current();
    let label = if now_playing.is_empty() {
        "—".to_string()
    } else {
        htmlescape::encode_minimal(&now_playing)
    };
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>loopcast</title></head>
<body>
<audio controls autoplay><source src="/stream.mp3" type="{STREAM_MIME}"></audio>
<p>Now playing: <span id="now-playing">{label}</span></p>
</body>
</html>
"#
    ))
}
