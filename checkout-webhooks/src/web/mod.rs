//! Web server module for receiving Stripe webhooks.
//!
//! This module provides a small axum server that:
//! - Receives signed webhooks from Stripe
//! - Verifies the signature against the raw body
//! - Dispatches each event to its registered handler
//!
//! Non-POST requests to the webhook route are answered 405 by the router.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, stripe_webhook, AppState, HealthResponse};

/// Path Stripe is configured to deliver to.
pub const WEBHOOK_PATH: &str = "/checkout/wh/";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(stripe_webhook))
        .route(WEBHOOK_PATH.trim_end_matches('/'), post(stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
