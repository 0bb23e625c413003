//! Session lifecycle against the SmartAPI backend.
//!
//! The flow is strictly ordered: build the client, log in with the
//! password + one-time code, then finish session setup (feed token,
//! profile, one token refresh). A rejected login is a normal outcome and
//! comes back as `None`; anything failing after a successful login is
//! fatal for startup. Logout is best-effort and never propagates.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::config::Credentials;
use crate::smartapi::{SessionInfo, SessionTokens, SmartApiClient, SmartApiError};

/// Construct the shared client handle. No network traffic happens here.
pub fn initialize_client(credentials: &Credentials) -> Result<Arc<SmartApiClient>, SmartApiError> {
    Ok(Arc::new(SmartApiClient::new(&credentials.api_key)?))
}

/// Log in and extract the session tokens.
///
/// A `status=false` response means the broker rejected the credentials or
/// the OTP; the payload is logged and `Ok(None)` returned so the caller can
/// abort startup without treating it as a crash. Transport and decode
/// failures are real errors and propagate.
pub async fn login(
    client: &SmartApiClient,
    client_id: &str,
    password: &str,
    otp: &str,
) -> Result<Option<SessionTokens>, SmartApiError> {
    let envelope = client.generate_session(client_id, password, otp).await?;

    if !envelope.status {
        error!(
            errorcode = %envelope.errorcode,
            message = %envelope.message,
            "login rejected by broker"
        );
        return Ok(None);
    }

    let tokens: SessionTokens = serde_json::from_value(envelope.data)?;
    client.adopt_session(&tokens).await;
    info!("login successful");
    Ok(Some(tokens))
}

/// Finish session setup from a successful login: feed token, account
/// profile, and the one-time token refresh. Each step failing is fatal:
/// a half-established session cannot serve tools meaningfully.
pub async fn setup_session(
    client: &SmartApiClient,
    tokens: &SessionTokens,
) -> Result<SessionInfo, SmartApiError> {
    let feed_token = client.get_feed_token().await?;
    let profile = client.get_profile(&tokens.refresh_token).await?;
    client.generate_tokens(&tokens.refresh_token).await?;

    Ok(SessionInfo {
        auth_token: tokens.jwt_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        feed_token,
        profile,
    })
}

/// Terminate the remote session. Runs unconditionally at shutdown, even
/// when startup failed partway, so every failure is logged and swallowed:
/// nothing may block the exit path.
pub async fn logout(client: &SmartApiClient, client_id: &str) -> Option<Value> {
    match client.terminate_session(client_id).await {
        Ok(result) => {
            info!("logout successful");
            Some(result)
        }
        Err(e) => {
            error!("logout failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smartapi::SmartApiClient;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
    const LOGOUT_PATH: &str = "/rest/secure/angelbroking/user/v1/logout";

    async fn client_for(server: &MockServer) -> SmartApiClient {
        SmartApiClient::with_base_url("test-key", server.uri()).unwrap()
    }

    fn success_login_body() -> serde_json::Value {
        json!({
            "status": true, "message": "SUCCESS", "errorcode": "",
            "data": {"jwtToken": "jwt-1", "refreshToken": "ref-1", "feedToken": "feed-1"}
        })
    }

    #[tokio::test]
    async fn rejected_login_returns_none_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false, "message": "Invalid totp", "errorcode": "AB1050", "data": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = login(&client, "C123", "pin", "000000").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn successful_login_extracts_tokens_and_authenticates_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_partial_json(
                json!({"clientcode": "C123", "password": "pin", "totp": "123456"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_login_body()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tokens = login(&client, "C123", "pin", "123456")
            .await
            .unwrap()
            .expect("session tokens");
        assert_eq!(tokens.jwt_token, "jwt-1");
        assert_eq!(tokens.refresh_token, "ref-1");
        // The handle picked up the feed token from the login payload.
        assert_eq!(client.get_feed_token().await.unwrap(), "feed-1");
    }

    #[tokio::test]
    async fn setup_session_runs_profile_and_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_login_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/secure/angelbroking/user/v1/getProfile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true, "message": "SUCCESS", "errorcode": "",
                "data": {"clientcode": "C123", "name": "Trader"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/auth/angelbroking/jwt/v1/generateTokens"))
            .and(body_partial_json(json!({"refreshToken": "ref-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true, "message": "SUCCESS", "errorcode": "",
                "data": {"jwtToken": "jwt-2", "refreshToken": "ref-2", "feedToken": "feed-2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tokens = login(&client, "C123", "pin", "123456")
            .await
            .unwrap()
            .unwrap();
        let info = setup_session(&client, &tokens).await.unwrap();

        assert_eq!(info.auth_token, "jwt-1");
        assert_eq!(info.refresh_token, "ref-1");
        assert_eq!(info.feed_token, "feed-1");
        assert_eq!(info.profile["clientcode"], "C123");
    }

    #[tokio::test]
    async fn setup_session_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_login_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/secure/angelbroking/user/v1/getProfile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false, "message": "Token expired", "errorcode": "AG8002", "data": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tokens = login(&client, "C123", "pin", "123456")
            .await
            .unwrap()
            .unwrap();
        assert!(setup_session(&client, &tokens).await.is_err());
    }

    #[tokio::test]
    async fn logout_swallows_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        // Never panics, never errors; just reports no result.
        assert!(logout(&client, "C123").await.is_none());
    }

    #[tokio::test]
    async fn logout_returns_backend_payload_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .and(body_partial_json(json!({"clientcode": "C123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true, "message": "SUCCESS", "errorcode": "", "data": "Logout Successfully"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = logout(&client, "C123").await;
        assert_eq!(result, Some(json!("Logout Successfully")));
    }
}
