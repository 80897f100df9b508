//! SDK error types

use thiserror::Error;
use tilt_core::TiltCoreError;

/// Errors surfaced by SDK operations
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Core error: {0}")]
    Core(#[from] TiltCoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No supply snapshot received yet")]
    NoSupplySnapshot,

    #[error("Push channel is not open")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Decode(err.to_string())
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(err: hex::FromHexError) -> Self {
        SdkError::Decode(err.to_string())
    }
}

/// Result type for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;
