//! Stripe webhook verification.
//!
//! This module turns a raw request body and its `Stripe-Signature` header into
//! a [`VerifiedEvent`], or a classified [`VerificationError`]:
//!
//! ```text
//! (body bytes, Stripe-Signature, secret) → verify() → VerifiedEvent | VerificationError
//! ```

pub mod error;
pub mod event;
pub mod signature;

pub use error::VerificationError;
pub use event::VerifiedEvent;
pub use signature::{sign_payload, signature_header, verify, verify_at, STRIPE_SIGNATURE_HEADER};
