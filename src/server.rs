//! MCP tool registry over the query gateway.
//!
//! Each tool forwards to one gateway operation and absorbs its failure:
//! a tool caller always receives either the broker payload or JSON `null`,
//! never a protocol-level error. Only startup can take the process down.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::gateway;
use crate::smartapi::{SmartApiClient, SmartApiError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HistoricalDataRequest {
    /// Exchange code, e.g. "NSE".
    pub exchange: String,
    /// Instrument token for the stock.
    pub symboltoken: String,
    /// Candle interval, e.g. "ONE_MINUTE", "ONE_HOUR", "ONE_DAY".
    pub interval: String,
    /// Range start in "YYYY-MM-DD HH:MM" format.
    pub fromdate: String,
    /// Range end in "YYYY-MM-DD HH:MM" format.
    pub todate: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OptionGreekRequest {
    /// Underlying name, e.g. "NIFTY".
    pub symboltoken: String,
    /// Contract expiry the greeks are requested for, e.g. "25JAN2024".
    pub expirydate: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MultiHistoricalDataRequest {
    /// Exchange code, e.g. "NSE".
    pub exchange: String,
    /// Instrument tokens to fetch; results come back in the same order,
    /// with null for any token whose fetch failed.
    pub symboltokens: Vec<String>,
    /// Candle interval, e.g. "ONE_MINUTE", "ONE_HOUR", "ONE_DAY".
    pub interval: String,
    /// Range start in "YYYY-MM-DD HH:MM" format.
    pub fromdate: String,
    /// Range end in "YYYY-MM-DD HH:MM" format.
    pub todate: String,
}

/// The MCP-facing server: the shared authenticated client plus the tool
/// router. Cloning shares the underlying handle.
#[derive(Clone)]
pub struct BrokerServer {
    api: Arc<SmartApiClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BrokerServer {
    pub fn new(api: Arc<SmartApiClient>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    /// Map a gateway failure to the `null` the tool contract promises,
    /// logging it with the operation's tag.
    fn absorb(tag: &str, result: Result<Value, SmartApiError>) -> Value {
        match result {
            Ok(value) => value,
            Err(e) => {
                error!("{tag}: {e}");
                Value::Null
            }
        }
    }

    fn respond(value: Value) -> CallToolResult {
        CallToolResult::success(vec![Content::text(value.to_string())])
    }

    #[tool(
        description = "Get historical candlestick data for one instrument from the Angel One API. Returns candle rows, or null if the fetch failed."
    )]
    async fn get_historical_data(
        &self,
        Parameters(req): Parameters<HistoricalDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = gateway::historical_candles(
            self.api.as_ref(),
            &req.exchange,
            &req.symboltoken,
            &req.interval,
            &req.fromdate,
            &req.todate,
        )
        .await;
        Ok(Self::respond(Self::absorb(
            "historical data fetch failed",
            result,
        )))
    }

    #[tool(
        description = "Get option greek data (delta, gamma, theta, vega) for an underlying at a given expiry. Returns greeks, or null if the fetch failed."
    )]
    async fn get_option_greek_data(
        &self,
        Parameters(req): Parameters<OptionGreekRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result =
            gateway::option_greeks(self.api.as_ref(), &req.symboltoken, &req.expirydate).await;
        Ok(Self::respond(Self::absorb(
            "option greek fetch failed",
            result,
        )))
    }

    #[tool(
        description = "Get historical candlestick data for multiple instruments. Returns one entry per requested token, in request order; a token whose fetch failed maps to null without affecting the others."
    )]
    async fn get_historical_data_multiple_stocks(
        &self,
        Parameters(req): Parameters<MultiHistoricalDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        let results = gateway::multi_historical_candles(
            self.api.as_ref(),
            &req.exchange,
            &req.symboltokens,
            &req.interval,
            &req.fromdate,
            &req.todate,
        )
        .await;
        let value = Value::Array(
            results
                .into_iter()
                .map(|entry| entry.unwrap_or(Value::Null))
                .collect(),
        );
        Ok(Self::respond(value))
    }

    #[tool(
        description = "Get portfolio holdings from the Angel One API. Returns holdings, or null if the fetch failed."
    )]
    async fn get_portfolio(&self) -> Result<CallToolResult, McpError> {
        let result = gateway::portfolio(self.api.as_ref()).await;
        Ok(Self::respond(Self::absorb("portfolio fetch failed", result)))
    }

    #[tool(
        description = "Get open positions from the Angel One API. Returns positions, or null if the fetch failed."
    )]
    async fn get_positional_data(&self) -> Result<CallToolResult, McpError> {
        let result = gateway::positions(self.api.as_ref()).await;
        Ok(Self::respond(Self::absorb("positions fetch failed", result)))
    }

    #[tool(
        description = "Get the trade book from the Angel One API. Returns trades, or null if the fetch failed."
    )]
    async fn get_trade_book(&self) -> Result<CallToolResult, McpError> {
        let result = gateway::trade_book(self.api.as_ref()).await;
        Ok(Self::respond(Self::absorb(
            "trade book fetch failed",
            result,
        )))
    }
}

#[tool_handler]
impl ServerHandler for BrokerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Angel One trading account tools: historical candles, option greeks, \
                 portfolio holdings, positions, and trade book. Every tool returns the \
                 broker payload as JSON, or null when the data is unavailable."
                    .to_string(),
            ),
        }
    }
}
