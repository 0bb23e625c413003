//! Credential loading from the process environment.
//!
//! All secrets arrive via environment variables (a local `.env` is read by
//! the entrypoint before this runs). They are held in memory for the
//! process lifetime and never written anywhere.

use anyhow::{anyhow, Result};

/// Broker credentials consumed once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// SmartAPI application key (`X-PrivateKey` header).
    pub api_key: String,
    /// Trading account client code.
    pub client_id: String,
    /// Account password or PIN.
    pub password: String,
    /// Base32 TOTP shared secret from the broker's authenticator setup.
    pub totp_secret: String,
    /// Accepted for interface compatibility; no login path consumes it.
    pub correlation_id: Option<String>,
}

impl Credentials {
    /// Load credentials from the environment, naming the first variable
    /// that is missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: require("ANGEL_API_KEY")?,
            client_id: require("ANGEL_CLIENT_ID")?,
            password: require("ANGEL_PASSWORD")?,
            totp_secret: require("ANGEL_TOTP_SECRET")?,
            correlation_id: std::env::var("ANGEL_CORRELATION_ID").ok(),
        })
    }
}

fn require(name: &str) -> Result<String> {
    let value =
        std::env::var(name).map_err(|_| anyhow!("missing environment variable {name}"))?;
    if value.trim().is_empty() {
        return Err(anyhow!("environment variable {name} is empty"));
    }
    Ok(value)
}
