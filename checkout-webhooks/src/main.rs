//! Checkout webhooks server.
//!
//! This binary runs a small web server that:
//! - Receives signed Stripe webhooks on `POST /checkout/wh/`
//! - Verifies the `Stripe-Signature` header against the raw body
//! - Dispatches each event to its registered handler

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use checkout::web::WEBHOOK_PATH;
use checkout::{checkout_registry, router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        signature_tolerance_secs = config.signature_tolerance_secs,
        diagnostic_errors = config.diagnostic_errors,
        "config_loaded"
    );

    let registry = checkout_registry(&config).context("Failed to build handler registry")?;
    info!(event_types = ?registry.event_types(), "handler_registry_built");

    let port = config.port;
    let app = router(AppState::new(config, registry));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, webhook_path = WEBHOOK_PATH, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM so in-flight webhooks can finish.
async fn shutdown_signal() {
    tokio::select! {
        () = interrupt() => info!(signal = "SIGINT", "shutdown_signal_received"),
        () = terminate() => info!(signal = "SIGTERM", "shutdown_signal_received"),
    }

    info!("web_server_shutting_down");
}

async fn interrupt() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "sigint_handler_failed");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "sigterm_handler_failed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
