//! REST and WebSocket API

mod handlers;
mod responses;
mod routes;
mod websocket;

pub use responses::*;
pub use routes::*;

use crate::config::ApiConfig;
use crate::core::ServerError;
use crate::farcaster::UsernameResolver;
use crate::hub::Hub;
use crate::store::TiltStore;
use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tilt_sdk::ChainReader;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Bind the API and serve it until `shutdown` fires.
///
/// Returns the bound address, which differs from the configured one when
/// port 0 was requested.
pub async fn start_server(
    state: ApiState,
    config: &ApiConfig,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = create_app(state, config);

    let listener = TcpListener::bind(&config.bind_address).await?;
    let local_addr = listener.local_addr()?;
    info!("API server listening on {}", local_addr);

    let handle = tokio::spawn(async move {
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await });
        if let Err(e) = serve.await {
            error!("API server error: {}", e);
        }
    });

    Ok((local_addr, handle))
}

/// Router with request tracing, plus CORS when enabled
pub fn create_app(state: ApiState, config: &ApiConfig) -> Router {
    let router = create_router(state);
    if config.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// All routes with request tracing
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .merge(create_contract_routes())
        .merge(create_social_routes())
        .merge(create_system_routes())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub hub: Arc<Hub>,
    pub resolver: Arc<dyn UsernameResolver>,
    /// Refreshes a holder's leaderboard entry after each reported activity
    pub chain: Option<Arc<dyn ChainReader>>,
}

impl ApiState {
    pub fn new(hub: Arc<Hub>, resolver: Arc<dyn UsernameResolver>) -> Self {
        Self {
            hub,
            resolver,
            chain: None,
        }
    }

    pub fn with_chain(mut self, chain: Option<Arc<dyn ChainReader>>) -> Self {
        self.chain = chain;
        self
    }

    pub fn store(&self) -> &Arc<dyn TiltStore> {
        self.hub.store()
    }
}

/// Error returned by handlers, rendered as `ErrorResponse`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            error!("Request failed: {}", err);
            ApiError::internal(err.to_string())
        }
    }
}

impl From<tilt_core::TiltCoreError> for ApiError {
    fn from(err: tilt_core::TiltCoreError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.status.as_u16(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        (self.status, Json(body)).into_response()
    }
}
