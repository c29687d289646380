//! HTTP endpoint handlers.
//!
//! The webhook handler only:
//! 1. Verifies the `Stripe-Signature` header against the raw body
//! 2. Dispatches the verified event to its handler
//! 3. Returns the handler's status and body
//!
//! There is no CSRF layer on these routes. Stripe calls them server to
//! server, with the signature standing in for a session.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::dispatch::{dispatch, HandlerRegistry};
use crate::stripe::{self, VerificationError, STRIPE_SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<HandlerRegistry>,
}

impl AppState {
    pub fn new(config: Config, registry: HandlerRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Stripe webhook endpoint.
///
/// Verification failures of every kind answer 400. Handler failures answer
/// 500 so that Stripe retries the delivery.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(STRIPE_SIGNATURE_HEADER),
        "stripe_webhook_received"
    );

    let signature = match headers.get(STRIPE_SIGNATURE_HEADER).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            return reject(&state.config, VerificationError::MissingOrMalformedHeader);
        }
    };

    let event = match stripe::verify(
        &body,
        signature,
        &state.config.webhook_secret,
        state.config.signature_tolerance_secs,
    ) {
        Ok(event) => event,
        Err(e) => return reject(&state.config, e),
    };

    let event_type = event.event_type().to_string();

    match dispatch(event, &state.registry) {
        Ok(result) => {
            info!(event_type = %event_type, status = result.status.as_u16(), "stripe_webhook_handled");
            result.into_response()
        }
        Err(e) => {
            error!(event_type = %event_type, error = %e, "stripe_webhook_handler_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the 400 response for a verification failure.
///
/// Only the unexpected-failure path may carry text, and only when diagnostic
/// bodies are enabled in configuration.
fn reject(config: &Config, err: VerificationError) -> Response {
    warn!(kind = err.kind(), error = %err, "stripe_webhook_rejected");

    match err {
        VerificationError::UnexpectedVerificationFailure(_) if config.diagnostic_errors => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}
