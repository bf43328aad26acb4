use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;

use crate::http::state::AppState;
use crate::playlist::mime::STREAM_MIME;

/// GET /stream.mp3 — endless MP3 body for one listener.
///
/// The listener event (geolocation + log append) runs on its own task, so a
/// slow lookup or a failing log write never delays or fails the response.
pub async fn serve_stream(State(state): State<AppState>, request: Request) -> Response {
    let connected_at = Utc::now();
    let ip = client_ip(&request);
    let session = state.engine.open_session_for(&ip);
    tracing::info!("Listener {} connected (session {})", ip, session.id());

    record_listener(&state, ip, connected_at);

    let body = Body::from_stream(session.map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, STREAM_MIME),
            (header::CACHE_CONTROL, "no-cache, no-store"),
        ],
        body,
    )
        .into_response()
}

/// The event keeps `connected_at` however long the lookup takes.
fn record_listener(state: &AppState, ip: String, connected_at: DateTime<Utc>) {
    let geo = state.geo.clone();
    let registry = state.registry.clone();
    tokio::spawn(async move {
        let country = geo.resolve_country(&ip).await;
        registry.append_event(ip, Some(country), connected_at).await;
    });
}

/// Client address: first X-Forwarded-For hop when behind a proxy, otherwise the
/// socket peer. "unknown" when neither is available.
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
