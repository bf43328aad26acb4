use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use loopcast::broadcast::{BroadcastEngine, NowPlaying};
use loopcast::listeners::{GeoConfig, GeoLookup, ListenerRegistry};
use loopcast::{cli, config, http, playlist};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On second Ctrl+C (during shutdown wait), force-exits immediately.
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\nloopcast: forced exit");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref())
        .and_then(|path| {
            match config::load_config(&path) {
                Ok(cfg) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    None
                }
            }
        });

    let config = config::Config::resolve(file_config, &args);

    // Library must be readable before we accept listeners; an empty one is fine.
    if let Err(e) = playlist::ensure_library_dir(&config.media_dir) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    let tracks = match playlist::list_tracks(&config.media_dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Library {} has {} tracks",
        config.media_dir.display(),
        tracks.len()
    );

    let geo = if config.geo_enabled {
        let geo_config = GeoConfig {
            base_url: config.geo_url.clone(),
            timeout: config.geo_timeout,
        };
        GeoLookup::new(geo_config).unwrap_or_else(|e| {
            tracing::warn!("{} -- geolocation disabled", e);
            GeoLookup::disabled()
        })
    } else {
        tracing::info!("Geolocation disabled");
        GeoLookup::disabled()
    };

    let state = http::state::AppState {
        engine: BroadcastEngine::new(config.media_dir.clone(), NowPlaying::new()),
        registry: ListenerRegistry::spawn(config.log_file.clone()),
        geo,
        current_window: config.current_window,
    };
    let app = http::build_router(state);

    let host = if config.localhost { "127.0.0.1" } else { "0.0.0.0" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });
    tracing::info!("loopcast streaming on http://{}/stream.mp3", addr);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let mut http_rx = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move { let _ = http_rx.recv().await; })
            .await
            .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(());

    // Stream bodies never finish on their own, so graceful shutdown would wait
    // forever on connected listeners. Give short requests a moment, then exit.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), server).await;

    tracing::info!("Goodbye.");
}
