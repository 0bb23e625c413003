//! MCP stdio server for an Angel One SmartAPI trading account.
//!
//! Startup: load credentials, build the client, generate a TOTP, log in,
//! finish session setup, then serve tools over stdio until the host closes
//! the transport. Logout runs unconditionally on the way out, whatever
//! happened before.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rmcp::{transport::stdio, ServiceExt};

use angelone_mcp::config::Credentials;
use angelone_mcp::server::BrokerServer;
use angelone_mcp::smartapi::SmartApiClient;
use angelone_mcp::{logging, session, totp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    logging::init_logging();

    let credentials = Credentials::from_env()?;
    let client = session::initialize_client(&credentials)?;

    let outcome = run(&client, &credentials).await;
    if let Err(e) = &outcome {
        tracing::error!("Application error: {}", e);

        let mut source = e.source();
        while let Some(err) = source {
            tracing::error!("   Caused by: {}", err);
            source = err.source();
        }
    }

    // Guaranteed-on-exit: attempt the remote logout no matter how far
    // startup or serving got.
    session::logout(&client, &credentials.client_id).await;
    logging::log_session_end();

    outcome
}

/// Startup and serve. Everything that can fail before or during serving
/// funnels through here so `main` can run the shutdown sequence once.
async fn run(client: &Arc<SmartApiClient>, credentials: &Credentials) -> Result<()> {
    let code = totp::generate_totp(&credentials.totp_secret)?;

    let tokens = session::login(client, &credentials.client_id, &credentials.password, &code)
        .await
        .context("login request failed")?;
    let Some(tokens) = tokens else {
        // The rejection payload has already been logged.
        bail!("broker rejected the login; not serving tools");
    };

    let info = session::setup_session(client, &tokens)
        .await
        .context("session setup failed")?;
    tracing::info!(
        client = %info.profile.get("clientcode").and_then(|v| v.as_str()).unwrap_or("unknown"),
        "session ready, serving tools"
    );

    let service = BrokerServer::new(Arc::clone(client))
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;

    Ok(())
}
