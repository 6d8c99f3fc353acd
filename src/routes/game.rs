use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::game::GameSnapshot, error::AppError, services::snapshot_service, state::SharedState,
};

/// Polling endpoint shared by the admin and player frontends.
pub fn router() -> Router<SharedState> {
    Router::new().route("/sessions/{session_id}/state", get(get_game_state))
}

/// Return the full polled state for a session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/state",
    tag = "game",
    params(("session_id" = Uuid, Path, description = "Session to read")),
    responses((status = 200, description = "Current game snapshot", body = GameSnapshot))
)]
pub async fn get_game_state(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSnapshot>, AppError> {
    let snapshot = snapshot_service::get_snapshot(&state, session_id).await?;
    Ok(Json(snapshot))
}
