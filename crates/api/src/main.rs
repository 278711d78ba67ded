use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoneops_api::config::ServerConfig;
use zoneops_api::router::build_app_router;
use zoneops_api::state::AppState;
use zoneops_canvas::{CanvasApi, HttpCanvasClient};
use zoneops_events::EventBus;
use zoneops_ledger::DeletionLedger;
use zoneops_pipeline::MacroEngine;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zoneops_api=debug,zoneops_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Canvas client ---
    let client = HttpCanvasClient::new(&config.canvas).expect("Failed to build canvas client");
    tracing::info!(base_url = %client.base_url(), "Canvas client ready");
    let api: Arc<dyn CanvasApi> = Arc::new(client);

    // --- Deletion ledger ---
    let ledger = Arc::new(DeletionLedger::new(&config.ledger_path, config.ledger_retention));
    tracing::info!(
        path = %ledger.path().display(),
        retention = ledger.retention(),
        "Deletion ledger configured",
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- App state ---
    let engine = Arc::new(MacroEngine::new(api, ledger, config.macro_settings()));
    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
        event_bus,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
