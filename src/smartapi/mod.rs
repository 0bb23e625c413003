//! Angel One SmartAPI REST client: typed envelope handling, session token
//! state, and one method per backend route.

pub mod client;
pub mod error;
pub mod types;

pub use client::SmartApiClient;
pub use error::SmartApiError;
pub use types::{CandleParams, Envelope, GreekParams, SessionInfo, SessionTokens};
