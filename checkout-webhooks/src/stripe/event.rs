//! Authenticated Stripe event.

use serde::Deserialize;
use serde_json::Value;

/// Wire shape of a Stripe event body.
///
/// Only `type` and `data` are required; the remaining envelope fields are
/// kept when Stripe sends them.
#[derive(Debug, Deserialize)]
pub(crate) struct EventEnvelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    data: Value,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    livemode: Option<bool>,
    #[serde(default)]
    api_version: Option<String>,
}

/// An event whose signature has been checked.
///
/// There is no public constructor and no `Deserialize` impl: the only way to
/// obtain one is through [`crate::stripe::verify`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedEvent {
    id: Option<String>,
    event_type: String,
    data: Value,
    created: Option<i64>,
    livemode: Option<bool>,
    api_version: Option<String>,
}

impl VerifiedEvent {
    pub(crate) fn from_envelope(envelope: EventEnvelope) -> Self {
        Self {
            id: envelope.id,
            event_type: envelope.event_type,
            data: envelope.data,
            created: envelope.created,
            livemode: envelope.livemode,
            api_version: envelope.api_version,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(event_type: &str, data: Value) -> Self {
        Self {
            id: None,
            event_type: event_type.to_string(),
            data,
            created: None,
            livemode: None,
            api_version: None,
        }
    }

    /// Event type, e.g. `payment_intent.succeeded`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The full `data` member of the event.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// `data.object`, the resource the event is about.
    pub fn object(&self) -> Option<&Value> {
        self.data.get("object")
    }

    /// Stripe event id (`evt_...`).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Creation time as Unix seconds.
    pub fn created(&self) -> Option<i64> {
        self.created
    }

    /// Whether the event came from live mode rather than test mode.
    pub fn livemode(&self) -> Option<bool> {
        self.livemode
    }

    /// Stripe API version the payload was rendered with.
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }
}
