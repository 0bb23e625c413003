pub mod config;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod session;
pub mod smartapi;
pub mod totp;

pub use config::Credentials;
pub use server::BrokerServer;
pub use smartapi::{SmartApiClient, SmartApiError};
