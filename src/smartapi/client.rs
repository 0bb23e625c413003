//! Angel One SmartAPI REST client.
//!
//! One method per backend route, all sharing the SmartAPI header set and
//! the `Envelope` response wrapper. The bearer token lives behind a lock so
//! the same handle can be shared by every tool for the process lifetime.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::SmartApiError;
use super::types::{CandleParams, Envelope, GreekParams, SessionTokens};

const DEFAULT_BASE_URL: &str = "https://apiconnect.angelone.in";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

mod routes {
    pub const LOGIN: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
    pub const LOGOUT: &str = "/rest/secure/angelbroking/user/v1/logout";
    pub const GENERATE_TOKENS: &str = "/rest/auth/angelbroking/jwt/v1/generateTokens";
    pub const PROFILE: &str = "/rest/secure/angelbroking/user/v1/getProfile";
    pub const CANDLE_DATA: &str = "/rest/secure/angelbroking/historical/v1/getCandleData";
    pub const OPTION_GREEK: &str = "/rest/secure/angelbroking/marketData/v1/optionGreek";
    pub const HOLDINGS: &str = "/rest/secure/angelbroking/portfolio/v1/getAllHolding";
    pub const POSITIONS: &str = "/rest/secure/angelbroking/order/v1/getPosition";
    pub const TRADE_BOOK: &str = "/rest/secure/angelbroking/order/v1/getTradeBook";
}

/// Tokens held for the lifetime of the authenticated session.
#[derive(Debug, Default)]
struct AuthState {
    jwt_token: Option<String>,
    refresh_token: Option<String>,
    feed_token: Option<String>,
}

/// Shared SmartAPI handle. Created once at startup, authenticated by the
/// session layer, then used by every query tool and by logout.
pub struct SmartApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    auth: RwLock<AuthState>,
}

impl SmartApiClient {
    /// Create a client against the production endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SmartApiError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by the tests).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SmartApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            auth: RwLock::new(AuthState::default()),
        })
    }

    /// Call the session-generation route. A `status=false` envelope is a
    /// normal outcome here (rejected credentials/OTP), so the raw envelope
    /// is returned and the caller decides what a rejection means.
    pub async fn generate_session(
        &self,
        client_code: &str,
        password: &str,
        totp: &str,
    ) -> Result<Envelope, SmartApiError> {
        self.call(
            Method::POST,
            routes::LOGIN,
            Some(json!({
                "clientcode": client_code,
                "password": password,
                "totp": totp,
            })),
        )
        .await
    }

    /// Store session tokens on the handle so subsequent calls carry the
    /// bearer token.
    pub async fn adopt_session(&self, tokens: &SessionTokens) {
        let mut auth = self.auth.write().await;
        auth.jwt_token = Some(tokens.jwt_token.clone());
        auth.refresh_token = Some(tokens.refresh_token.clone());
        auth.feed_token = (!tokens.feed_token.is_empty()).then(|| tokens.feed_token.clone());
    }

    /// Feed token captured at login. Used by market-data streaming clients;
    /// this process only reports it as part of the session info.
    pub async fn get_feed_token(&self) -> Result<String, SmartApiError> {
        self.auth
            .read()
            .await
            .feed_token
            .clone()
            .ok_or(SmartApiError::MissingToken("feed"))
    }

    /// Fetch the account profile for the logged-in user.
    pub async fn get_profile(&self, refresh_token: &str) -> Result<Value, SmartApiError> {
        self.call_checked(
            Method::GET,
            routes::PROFILE,
            Some(json!({ "refreshToken": refresh_token })),
        )
        .await
    }

    /// Regenerate the auth tokens from the refresh token and adopt the new
    /// set on this handle.
    pub async fn generate_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<SessionTokens, SmartApiError> {
        let data = self
            .call_checked(
                Method::POST,
                routes::GENERATE_TOKENS,
                Some(json!({ "refreshToken": refresh_token })),
            )
            .await?;
        let tokens: SessionTokens = serde_json::from_value(data)?;
        self.adopt_session(&tokens).await;
        Ok(tokens)
    }

    /// Historical candle data for one instrument.
    pub async fn candle_data(&self, params: &CandleParams) -> Result<Value, SmartApiError> {
        self.call_checked(
            Method::POST,
            routes::CANDLE_DATA,
            Some(serde_json::to_value(params)?),
        )
        .await
    }

    /// Option greeks for an underlying at an expiry.
    pub async fn option_greek(&self, params: &GreekParams) -> Result<Value, SmartApiError> {
        self.call_checked(
            Method::POST,
            routes::OPTION_GREEK,
            Some(serde_json::to_value(params)?),
        )
        .await
    }

    /// All portfolio holdings.
    pub async fn holdings(&self) -> Result<Value, SmartApiError> {
        self.call_checked(Method::GET, routes::HOLDINGS, None).await
    }

    /// Open positions.
    pub async fn positions(&self) -> Result<Value, SmartApiError> {
        self.call_checked(Method::GET, routes::POSITIONS, None).await
    }

    /// Trade book for the day.
    pub async fn trade_book(&self) -> Result<Value, SmartApiError> {
        self.call_checked(Method::GET, routes::TRADE_BOOK, None).await
    }

    /// Terminate the remote session.
    pub async fn terminate_session(&self, client_code: &str) -> Result<Value, SmartApiError> {
        self.call_checked(
            Method::POST,
            routes::LOGOUT,
            Some(json!({ "clientcode": client_code })),
        )
        .await
    }

    /// Send a request with the SmartAPI header set and decode the envelope.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope, SmartApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "smartapi request");

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("X-UserType", "USER")
            .header("X-SourceID", "WEB")
            .header("X-ClientLocalIP", "127.0.0.1")
            .header("X-ClientPublicIP", "127.0.0.1")
            .header("X-MACAddress", "00:00:00:00:00:00")
            .header("X-PrivateKey", &self.api_key);

        if let Some(jwt) = self.auth.read().await.jwt_token.clone() {
            request = request.bearer_auth(jwt);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SmartApiError::Api {
                code: status.as_str().to_string(),
                message: text,
            });
        }

        Ok(response.json::<Envelope>().await?)
    }

    /// Like `call`, but a `status=false` envelope is an error. Every route
    /// except session generation uses this.
    async fn call_checked(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, SmartApiError> {
        let envelope = self.call(method, path, body).await?;
        if !envelope.status {
            return Err(SmartApiError::Api {
                code: envelope.errorcode,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }
}
