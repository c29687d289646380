//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup. The webhook signing secret and the
//! Stripe API key must come from the deployment environment and are never
//! logged.

use std::env;
use std::fmt;

use thiserror::Error;
use tracing::warn;

/// Default replay tolerance for signed webhook timestamps, in seconds.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is set but empty")]
    Empty(&'static str),
}

/// A secret string whose value never appears in `Debug` output.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Stripe webhook signing secret (`whsec_...`)
    pub webhook_secret: Secret,

    /// Stripe API key, available to event handlers
    pub stripe_api_key: Secret,

    /// Maximum distance in seconds between a signed timestamp and now.
    /// Zero disables the check.
    pub signature_tolerance_secs: u64,

    /// Include the failure text in 400 bodies for unexpected verification errors
    pub diagnostic_errors: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080),

            webhook_secret: required(&lookup, "STRIPE_WH_SECRET")?,

            stripe_api_key: required(&lookup, "STRIPE_SECRET_KEY")?,

            signature_tolerance_secs: parse_or(
                &lookup,
                "STRIPE_WH_TOLERANCE_SECS",
                DEFAULT_SIGNATURE_TOLERANCE_SECS,
            ),

            diagnostic_errors: parse_bool(&lookup, "WEBHOOK_DIAGNOSTIC_ERRORS"),
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<Secret, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or(ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(Secret::new(value))
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => false,
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes") => {
            true
        }
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" || v.eq_ignore_ascii_case("no") => {
            false
        }
        Some(v) => {
            warn!(env_var = name, value = %v, "Invalid boolean value, using default");
            false
        }
    }
}
