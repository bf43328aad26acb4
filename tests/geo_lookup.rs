use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use loopcast::listeners::{GeoConfig, GeoLookup, UNKNOWN_COUNTRY};

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_service(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn lookup(base_url: String, timeout: Duration) -> GeoLookup {
    GeoLookup::new(GeoConfig { base_url, timeout }).unwrap()
}

async fn country_for(Path(ip): Path<String>) -> Json<Value> {
    let country = match ip.as_str() {
        "8.8.8.8" => "United States",
        "41.33.1.1" => "Egypt",
        _ => return Json(json!({ "status": "fail", "message": "reserved range" })),
    };
    Json(json!({ "status": "success", "country": country }))
}

#[tokio::test]
async fn resolves_country_from_service() {
    let base = spawn_service(Router::new().route("/{ip}", get(country_for))).await;
    let geo = lookup(base, Duration::from_secs(2));

    assert_eq!(geo.resolve_country("8.8.8.8").await, "United States");
    assert_eq!(geo.resolve_country("41.33.1.1").await, "Egypt");
}

#[tokio::test]
async fn failed_status_is_unknown() {
    let base = spawn_service(Router::new().route("/{ip}", get(country_for))).await;
    let geo = lookup(base, Duration::from_secs(2));

    assert_eq!(geo.resolve_country("1.2.3.4").await, UNKNOWN_COUNTRY);
}

#[tokio::test]
async fn malformed_body_is_unknown() {
    let router = Router::new().route("/{ip}", get(|| async { "<html>not json</html>" }));
    let geo = lookup(spawn_service(router).await, Duration::from_secs(2));

    assert_eq!(geo.resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
}

#[tokio::test]
async fn missing_country_field_is_unknown() {
    let router = Router::new().route("/{ip}", get(|| async { Json(json!({ "status": "success" })) }));
    let geo = lookup(spawn_service(router).await, Duration::from_secs(2));

    assert_eq!(geo.resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
}

#[tokio::test]
async fn slow_service_times_out_to_unknown() {
    let router = Router::new().route(
        "/{ip}",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "country": "Too Late" }))
        }),
    );
    let geo = lookup(spawn_service(router).await, Duration::from_millis(100));

    let started = std::time::Instant::now();
    assert_eq!(geo.resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_service_is_unknown() {
    // Bind then drop so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let geo = lookup(format!("http://{addr}"), Duration::from_millis(500));
    assert_eq!(geo.resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
}

#[tokio::test]
async fn successful_answers_are_cached_per_ip() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/{ip}",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "country": "Egypt" }))
            }),
        )
        .with_state(Arc::clone(&hits));
    let geo = lookup(spawn_service(router).await, Duration::from_secs(2));

    for _ in 0..3 {
        assert_eq!(geo.resolve_country("41.33.1.1").await, "Egypt");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn private_addresses_skip_the_network() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/{ip}",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "country": "Nowhere" }))
            }),
        )
        .with_state(Arc::clone(&hits));
    let geo = lookup(spawn_service(router).await, Duration::from_secs(2));

    for ip in ["127.0.0.1", "192.168.1.10", "not-an-ip", "unknown"] {
        assert_eq!(geo.resolve_country(ip).await, UNKNOWN_COUNTRY);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_lookup_is_always_unknown() {
    assert_eq!(GeoLookup::disabled().resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
}
