//! API route definitions

use super::{handlers::*, websocket::websocket_handler, ApiState};
use axum::{
    routing::{get, post},
    Router,
};

/// Contract state, activity feed and leaderboards
pub fn create_contract_routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/api/contract/state",
            get(get_contract_state).post(update_contract_state),
        )
        .route("/api/contract/activities", get(list_activities))
        .route("/api/contract/activity", post(create_activity))
        .route("/api/contract/leaderboard", post(update_leaderboard))
        .route("/api/contract/leaderboard/:side", get(get_leaderboard))
}

/// Username resolution
pub fn create_social_routes() -> Router<ApiState> {
    Router::new().route("/api/farcaster/users", get(get_farcaster_users))
}

/// Health and the push channel
pub fn create_system_routes() -> Router<ApiState> {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/ws", get(websocket_handler))
}
