//! SmartAPI error types.

/// Failures surfaced by the SmartAPI REST client.
#[derive(Debug, thiserror::Error)]
pub enum SmartApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("broker API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("failed to decode broker response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no {0} token available; session not established")]
    MissingToken(&'static str),
}
