//! Event-type to handler mapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::HandlerOutcome;
use crate::stripe::VerifiedEvent;

/// A handler invoked with the full verified event.
pub type EventHandler = Arc<dyn Fn(&VerifiedEvent) -> HandlerOutcome + Send + Sync>;

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a handler is already registered for event type {0:?}")]
    DuplicateEventType(String),
}

/// Immutable mapping from event type to handler, with a default for misses.
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, EventHandler>,
    default: EventHandler,
}

impl HandlerRegistry {
    /// Start building a registry whose misses go to `default`.
    pub fn builder<F>(default: F) -> RegistryBuilder
    where
        F: Fn(&VerifiedEvent) -> HandlerOutcome + Send + Sync + 'static,
    {
        RegistryBuilder {
            handlers: HashMap::new(),
            default: Arc::new(default),
        }
    }

    /// Handler registered for exactly `event_type`, if any.
    pub fn get(&self, event_type: &str) -> Option<&EventHandler> {
        self.handlers.get(event_type)
    }

    /// Handler for `event_type`, or the default handler.
    ///
    /// Matching is exact and case-sensitive.
    pub fn lookup(&self, event_type: &str) -> &EventHandler {
        self.get(event_type).unwrap_or(&self.default)
    }

    /// Handler used when no event type matches.
    pub fn default_handler(&self) -> &EventHandler {
        &self.default
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Explicitly registered event types, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_types", &self.event_types())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerRegistry`].
pub struct RegistryBuilder {
    handlers: HashMap<String, EventHandler>,
    default: EventHandler,
}

impl RegistryBuilder {
    /// Register `handler` for `event_type`. Each event type may appear once.
    pub fn on<F>(mut self, event_type: impl Into<String>, handler: F) -> Result<Self, RegistryError>
    where
        F: Fn(&VerifiedEvent) -> HandlerOutcome + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        if self.handlers.contains_key(&event_type) {
            return Err(RegistryError::DuplicateEventType(event_type));
        }
        self.handlers.insert(event_type, Arc::new(handler));
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
            default: self.default,
        }
    }
}
