//! Centralized error types for the sync service

use thiserror::Error;
use tilt_core::TiltCoreError;
use tilt_sdk::SdkError;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Chain error: {0}")]
    Chain(#[from] SdkError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for service operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServerError::Validation(_))
    }
}

impl From<TiltCoreError> for ServerError {
    fn from(err: TiltCoreError) -> Self {
        ServerError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::Upstream(err.to_string())
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        ServerError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServerError::Configuration(err.to_string())
    }
}
