use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::requests::ConfirmWinRequest;
use shared::models::snapshot::TableView;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables))
        .route("/tables/rebalance", post(force_rebalance))
        .route("/tables/{table_id}/claim", post(claim_win))
        .route("/tables/{table_id}/confirm", post(confirm_win))
}

async fn list_tables(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
) -> Json<Vec<TableView>> {
    Json(state.lobby_service.snapshot().await.tables)
}

async fn claim_win(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(table_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let player_id = authenticated_user.user_id;

    state
        .lobby_service
        .claim_win(&table_id, &player_id)
        .await
        .map_err(|e| {
            error!(
                "Win claim failed for {} at table {}: {}",
                player_id, table_id, e
            );
            ApiError::from(e)
        })?;

    debug!("Player {} claimed a win at table {}", player_id, table_id);
    Ok(StatusCode::OK)
}

async fn confirm_win(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(table_id): Path<String>,
    Json(payload): Json<ConfirmWinRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .lobby_service
        .confirm_win(&table_id, &payload.winner_id, payload.confirmed)
        .await
        .map_err(|e| {
            error!("Win confirmation failed at table {}: {}", table_id, e);
            ApiError::from(e)
        })?;

    debug!(
        "Confirmation ({}) processed for table {}",
        payload.confirmed, table_id
    );
    Ok(StatusCode::OK)
}

/// Administrative force-reassignment: run a pass without any other action.
async fn force_rebalance(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.lobby_service.rebalance().await.map_err(|e| {
        error!("Forced reassignment failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(StatusCode::OK)
}
