//! Event dispatch.
//!
//! Routes a verified event to the handler registered for its type, or to the
//! registry's default handler:
//!
//! ```text
//! VerifiedEvent → dispatch() → registry.lookup(type) → handler(&event) → HandlerResult
//! ```

pub mod checkout;
pub mod registry;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::stripe::VerifiedEvent;

pub use checkout::{checkout_registry, CheckoutHandler};
pub use registry::{EventHandler, HandlerRegistry, RegistryBuilder, RegistryError};

/// What every handler returns: a status code and an optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResult {
    pub status: StatusCode,
    pub body: Option<String>,
}

impl HandlerResult {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    /// Status only, no body.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }
}

impl IntoResponse for HandlerResult {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, body).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// Handler return type. An `Err` is a handler-level failure and is passed
/// through the dispatcher untouched.
pub type HandlerOutcome = anyhow::Result<HandlerResult>;

/// Invoke exactly one handler for `event` and return its outcome.
pub fn dispatch(event: VerifiedEvent, registry: &HandlerRegistry) -> HandlerOutcome {
    let handler = match registry.get(event.event_type()) {
        Some(handler) => {
            info!(event_type = %event.event_type(), event_id = ?event.id(), "event_dispatch");
            handler
        }
        None => {
            info!(
                event_type = %event.event_type(),
                event_id = ?event.id(),
                "event_dispatch_default"
            );
            registry.default_handler()
        }
    };

    handler(&event)
}
