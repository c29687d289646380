//! Checkout webhooks - Stripe webhook receiver.
//!
//! This library provides the pieces the `checkout-webhooks` binary wires
//! together:
//! - `stripe`: signature verification producing a `VerifiedEvent`
//! - `dispatch`: the event-type to handler registry and dispatcher
//! - `web`: the axum endpoint and router
//!
//! ## Request Flow
//!
//! ```text
//! POST /checkout/wh/ → verify() → VerifiedEvent → dispatch() → handler → response
//!                         ↓
//!                 VerificationError → 400
//! ```

pub mod config;
pub mod dispatch;
pub mod stripe;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, Secret};
pub use dispatch::{
    checkout_registry, dispatch, CheckoutHandler, HandlerOutcome, HandlerRegistry, HandlerResult,
    RegistryError,
};
pub use stripe::{verify, VerificationError, VerifiedEvent};
pub use web::{router, AppState};
