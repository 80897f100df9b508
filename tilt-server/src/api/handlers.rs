//! API request handlers

use super::{responses::*, ApiError, ApiState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use tilt_core::constants::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_LEADERBOARD_LIMIT, MAX_PAGE_LIMIT};
use tilt_core::{
    ActivityEvent, ContractState, LeaderboardEntry, LeaderboardUpdate, NewActivity, Side,
};
use tracing::{debug, info, warn};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `?limit=`; anything that is not a positive integer means the default
#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    fn resolve(&self, default: usize) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
            .min(MAX_PAGE_LIMIT)
    }
}

#[derive(Deserialize)]
pub struct AddressesQuery {
    pub addresses: Option<String>,
}

/// Body of `POST /api/contract/state`; omitted fields take their defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStateBody {
    pub total_supply: Option<String>,
    pub ups: Option<String>,
    pub is_up_only: Option<bool>,
    pub tvl: Option<String>,
    pub current_price: Option<String>,
}

impl From<ContractStateBody> for ContractState {
    fn from(body: ContractStateBody) -> Self {
        let defaults = ContractState::default();
        ContractState {
            total_supply: body.total_supply.unwrap_or(defaults.total_supply),
            ups: body.ups.unwrap_or(defaults.ups),
            is_up_only: body.is_up_only.unwrap_or(defaults.is_up_only),
            tvl: body.tvl.unwrap_or(defaults.tvl),
            current_price: body.current_price.unwrap_or(defaults.current_price),
        }
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Health check handler
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

pub async fn get_contract_state(State(state): State<ApiState>) -> ApiResult<ContractState> {
    Ok(Json(state.store().contract_state().await?))
}

/// Replace the contract snapshot and push it to every client
pub async fn update_contract_state(
    State(state): State<ApiState>,
    body: Result<Json<ContractStateBody>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let contract: ContractState = json_body(body)?.into();
    contract.validate()?;

    state.store().set_contract_state(contract).await?;
    state.hub.broadcast_contract_state().await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn list_activities(
    State(state): State<ApiState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<ActivityEvent>> {
    let limit = query.resolve(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(state.store().activities(limit).await?))
}

/// Record a confirmed transaction in the feed and broadcast it
pub async fn create_activity(
    State(state): State<ApiState>,
    body: Result<Json<NewActivity>, JsonRejection>,
) -> ApiResult<ActivityCreatedResponse> {
    let request = json_body(body)?;
    let activity = request.into_event(
        uuid::Uuid::new_v4().to_string(),
        chrono::Utc::now().timestamp_millis(),
    );
    activity.validate()?;

    if state.hub.publish_activity(activity.clone()).await? {
        info!("New {:?} activity {} from {}", activity.kind, activity.id, activity.address);
        refresh_holder(&state, &activity.address).await;
    } else {
        debug!("Activity {} already recorded", activity.id);
    }

    Ok(Json(ActivityCreatedResponse {
        success: true,
        activity,
    }))
}

/// Re-read a holder's balance and side from the chain and update the
/// leaderboard. Failures only cost freshness.
async fn refresh_holder(state: &ApiState, address: &str) {
    let Some(chain) = &state.chain else {
        return;
    };

    let user = match chain.user_state(address).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Could not refresh holder {}: {}", address, e);
            return;
        }
    };

    let update = LeaderboardUpdate {
        address: user.address,
        balance: user.balance,
        side: user.side,
    };
    if let Err(e) = state.store().upsert_leaderboard(update).await {
        warn!("Could not update leaderboard for {}: {}", address, e);
        return;
    }
    if let Err(e) = state.hub.broadcast_leaderboard().await {
        warn!("Leaderboard broadcast failed: {}", e);
    }
}

pub async fn get_leaderboard(
    State(state): State<ApiState>,
    Path(side): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let side = Side::from_board_name(&side)
        .ok_or_else(|| ApiError::bad_request("Invalid side parameter"))?;
    let limit = query.resolve(DEFAULT_LEADERBOARD_LIMIT);
    Ok(Json(state.store().leaderboard(side, limit).await?))
}

/// Upsert one holder, re-rank and broadcast both boards
pub async fn update_leaderboard(
    State(state): State<ApiState>,
    body: Result<Json<LeaderboardUpdate>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let update = json_body(body)?;
    state.store().upsert_leaderboard(update).await?;
    state.hub.broadcast_leaderboard().await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_farcaster_users(
    State(state): State<ApiState>,
    Query(query): Query<AddressesQuery>,
) -> ApiResult<FarcasterUsersResponse> {
    let addresses: Vec<String> = query
        .addresses
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    if addresses.is_empty() {
        return Ok(Json(FarcasterUsersResponse::new()));
    }
    Ok(Json(state.resolver.resolve(&addresses).await?))
}
