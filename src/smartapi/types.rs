//! Type definitions for SmartAPI requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform SmartAPI response envelope. Every REST route wraps its payload
/// in `{status, message, errorcode, data}`; a `status` of `false` carries
/// the rejection reason in `message`/`errorcode`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errorcode: String,
    #[serde(default)]
    pub data: Value,
}

/// Tokens returned by a successful session generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub jwt_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub feed_token: String,
}

/// Parameters for the historical candle route.
#[derive(Debug, Clone, Serialize)]
pub struct CandleParams {
    pub exchange: String,
    pub symboltoken: String,
    pub interval: String,
    pub fromdate: String,
    pub todate: String,
}

/// Parameters for the option greeks route. The instrument token is sent
/// under the `name` key, which is what the backend expects.
#[derive(Debug, Clone, Serialize)]
pub struct GreekParams {
    pub name: String,
    pub expirydate: String,
}

/// Everything the process knows about the authenticated session once
/// startup completes. Owned by the session layer; the query gateway only
/// ever sees the client handle.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub auth_token: String,
    pub refresh_token: String,
    pub feed_token: String,
    pub profile: Value,
}
