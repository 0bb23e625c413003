//! Query gateway: uniform forwarding of tool parameters to the broker.
//!
//! Every operation builds the backend's parameter record, makes exactly one
//! client call per instrument, and returns the raw payload untouched. The
//! `SmartApi` trait is the seam that lets the operations run against a fake
//! client in tests; the real implementation is `SmartApiClient`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::smartapi::{CandleParams, GreekParams, SmartApiClient, SmartApiError};

/// Query surface of the brokerage backend used by the tools.
#[async_trait]
pub trait SmartApi: Send + Sync {
    async fn candle_data(&self, params: &CandleParams) -> Result<Value, SmartApiError>;
    async fn option_greek(&self, params: &GreekParams) -> Result<Value, SmartApiError>;
    async fn holdings(&self) -> Result<Value, SmartApiError>;
    async fn positions(&self) -> Result<Value, SmartApiError>;
    async fn trade_book(&self) -> Result<Value, SmartApiError>;
}

#[async_trait]
impl SmartApi for SmartApiClient {
    async fn candle_data(&self, params: &CandleParams) -> Result<Value, SmartApiError> {
        SmartApiClient::candle_data(self, params).await
    }

    async fn option_greek(&self, params: &GreekParams) -> Result<Value, SmartApiError> {
        SmartApiClient::option_greek(self, params).await
    }

    async fn holdings(&self) -> Result<Value, SmartApiError> {
        SmartApiClient::holdings(self).await
    }

    async fn positions(&self) -> Result<Value, SmartApiError> {
        SmartApiClient::positions(self).await
    }

    async fn trade_book(&self) -> Result<Value, SmartApiError> {
        SmartApiClient::trade_book(self).await
    }
}

/// Historical candles for a single instrument.
pub async fn historical_candles(
    api: &dyn SmartApi,
    exchange: &str,
    symbol_token: &str,
    interval: &str,
    from_date: &str,
    to_date: &str,
) -> Result<Value, SmartApiError> {
    api.candle_data(&CandleParams {
        exchange: exchange.to_string(),
        symboltoken: symbol_token.to_string(),
        interval: interval.to_string(),
        fromdate: from_date.to_string(),
        todate: to_date.to_string(),
    })
    .await
}

/// Option greeks for an underlying at an expiry. The backend takes the
/// instrument under the `name` key.
pub async fn option_greeks(
    api: &dyn SmartApi,
    symbol_token: &str,
    expiry_date: &str,
) -> Result<Value, SmartApiError> {
    api.option_greek(&GreekParams {
        name: symbol_token.to_string(),
        expirydate: expiry_date.to_string(),
    })
    .await
}

/// Historical candles for several instruments, one backend call per token,
/// in input order.
///
/// Per-item isolation: a failing token is logged and recorded as `None` at
/// its position; the other tokens keep their results. The output always has
/// exactly one entry per input token.
pub async fn multi_historical_candles(
    api: &dyn SmartApi,
    exchange: &str,
    symbol_tokens: &[String],
    interval: &str,
    from_date: &str,
    to_date: &str,
) -> Vec<Option<Value>> {
    let mut results = Vec::with_capacity(symbol_tokens.len());
    for token in symbol_tokens {
        let params = CandleParams {
            exchange: exchange.to_string(),
            symboltoken: token.clone(),
            interval: interval.to_string(),
            fromdate: from_date.to_string(),
            todate: to_date.to_string(),
        };
        match api.candle_data(&params).await {
            Ok(data) => results.push(Some(data)),
            Err(e) => {
                error!(symboltoken = %token, "historical data fetch failed: {e}");
                results.push(None);
            }
        }
    }
    results
}

/// All portfolio holdings.
pub async fn portfolio(api: &dyn SmartApi) -> Result<Value, SmartApiError> {
    api.holdings().await
}

/// Open positions.
pub async fn positions(api: &dyn SmartApi) -> Result<Value, SmartApiError> {
    api.positions().await
}

/// Trade book for the day.
pub async fn trade_book(api: &dyn SmartApi) -> Result<Value, SmartApiError> {
    api.trade_book().await
}
