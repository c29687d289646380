//! Checkout event handlers and the standard registry.
//!
//! Order bookkeeping lives outside this crate; these handlers acknowledge the
//! event so Stripe stops redelivering it.

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::info;

use crate::config::{Config, Secret};
use crate::dispatch::{HandlerOutcome, HandlerRegistry, HandlerResult, RegistryError};
use crate::stripe::VerifiedEvent;

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Registry used by the server. New event types get one `.on(...)` line here.
pub fn checkout_registry(config: &Config) -> Result<HandlerRegistry, RegistryError> {
    let handler = Arc::new(CheckoutHandler::new(config));

    let default = Arc::clone(&handler);
    let succeeded = Arc::clone(&handler);
    let failed = handler;

    Ok(HandlerRegistry::builder(move |event: &VerifiedEvent| default.handle_event(event))
        .on(PAYMENT_INTENT_SUCCEEDED, move |event: &VerifiedEvent| {
            succeeded.handle_payment_intent_succeeded(event)
        })?
        .on(PAYMENT_INTENT_PAYMENT_FAILED, move |event: &VerifiedEvent| {
            failed.handle_payment_intent_payment_failed(event)
        })?
        .build())
}

/// Handlers for checkout payment events.
///
/// Holds the Stripe API key so handlers can call back into the Stripe API
/// when they need more than the event carries.
#[derive(Debug, Clone)]
pub struct CheckoutHandler {
    api_key: Secret,
}

impl CheckoutHandler {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.stripe_api_key.clone(),
        }
    }

    /// Stripe API key for outbound calls.
    pub fn api_key(&self) -> &Secret {
        &self.api_key
    }

    /// Generic handler for any event without a dedicated handler.
    pub fn handle_event(&self, event: &VerifiedEvent) -> HandlerOutcome {
        info!(event_type = %event.event_type(), event_id = ?event.id(), "webhook_unhandled");

        Ok(HandlerResult::new(
            StatusCode::OK,
            format!("Unhandled webhook received: {}", event.event_type()),
        ))
    }

    /// `payment_intent.succeeded`
    pub fn handle_payment_intent_succeeded(&self, event: &VerifiedEvent) -> HandlerOutcome {
        info!(
            event_id = ?event.id(),
            payment_intent = ?payment_intent_id(event),
            api_key_configured = !self.api_key.is_empty(),
            "payment_intent_succeeded"
        );

        Ok(HandlerResult::new(
            StatusCode::OK,
            format!("Webhook received: {}", event.event_type()),
        ))
    }

    /// `payment_intent.payment_failed`
    pub fn handle_payment_intent_payment_failed(&self, event: &VerifiedEvent) -> HandlerOutcome {
        info!(
            event_id = ?event.id(),
            payment_intent = ?payment_intent_id(event),
            api_key_configured = !self.api_key.is_empty(),
            "payment_intent_payment_failed"
        );

        Ok(HandlerResult::new(
            StatusCode::OK,
            format!("Webhook received: {}", event.event_type()),
        ))
    }
}

/// The payment intent id from `data.object.id`, or `data.id` for flat payloads.
fn payment_intent_id(event: &VerifiedEvent) -> Option<&str> {
    event
        .object()
        .unwrap_or_else(|| event.data())
        .get("id")
        .and_then(|v| v.as_str())
}
