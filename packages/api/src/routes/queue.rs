use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::requests::TableActionRequest;
use shared::models::snapshot::{LobbySnapshot, TableView};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/queue", get(queue_status))
        .route("/queue/checkin", post(check_in))
        .route("/queue/leave", post(leave))
        .route("/queue/skip", post(skip))
        .route("/queue/accept", post(accept_invite))
        .route("/queue/decline", post(decline_invite))
}

#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub user_id: String,
    pub queue: Vec<shared::models::queue::QueueEntry>,
    pub tables: Vec<TableView>,
}

async fn queue_status(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Json<QueueStatusResponse> {
    let LobbySnapshot { queue, tables } = state.lobby_service.snapshot().await;
    Json(QueueStatusResponse {
        user_id: authenticated_user.user_id,
        queue,
        tables,
    })
}

async fn check_in(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state.lobby_service.check_in(&player_id).await.map_err(|e| {
        error!("Check-in failed for {}: {}", player_id, e);
        ApiError::from(e)
    })?;

    debug!("Player {} checked in", player_id);
    Ok(StatusCode::OK)
}

async fn leave(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state.lobby_service.leave(&player_id).await.map_err(|e| {
        error!("Leave failed for {}: {}", player_id, e);
        ApiError::from(e)
    })?;

    debug!("Player {} left the lobby", player_id);
    Ok(StatusCode::OK)
}

async fn skip(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state
        .lobby_service
        .skip_turn(&player_id)
        .await
        .map_err(|e| {
            error!("Skip failed for {}: {}", player_id, e);
            ApiError::from(e)
        })?;

    debug!("Player {} skipped their turn", player_id);
    Ok(StatusCode::OK)
}

async fn accept_invite(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<TableActionRequest>,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state
        .lobby_service
        .accept_invite(&player_id, &payload.table_id)
        .await
        .map_err(|e| {
            error!(
                "Accept failed for {} at table {}: {}",
                player_id, payload.table_id, e
            );
            ApiError::from(e)
        })?;

    debug!("Player {} accepted table {}", player_id, payload.table_id);
    Ok(StatusCode::OK)
}

async fn decline_invite(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<TableActionRequest>,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state
        .lobby_service
        .decline_invite(&player_id, &payload.table_id)
        .await
        .map_err(|e| {
            error!(
                "Decline failed for {} at table {}: {}",
                player_id, payload.table_id, e
            );
            ApiError::from(e)
        })?;

    debug!("Player {} declined table {}", player_id, payload.table_id);
    Ok(StatusCode::OK)
}
