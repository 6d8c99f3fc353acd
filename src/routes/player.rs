use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::player::{
        AnswerRequest, AnswerResponse, BuzzRequest, BuzzResponse, JoinRequest, JoinResponse,
        PlayerSummaryResponse, SpokenRequest, SpokenResponse,
    },
    error::AppError,
    services::{player_service, snapshot_service},
    state::SharedState,
};

/// Player-facing endpoints: joining and in-game actions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{session_id}/players", post(join))
        .route("/sessions/{session_id}/buzz", post(buzz))
        .route("/sessions/{session_id}/answers", post(submit_answer))
        .route("/sessions/{session_id}/spoken", post(mark_spoken))
        .route(
            "/sessions/{session_id}/players/{player_id}/summary",
            get(get_player_summary),
        )
}

/// Join a session by nickname. Rejoining with the same nickname returns the
/// existing player id.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/players",
    tag = "player",
    params(("session_id" = Uuid, Path, description = "Session to join")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player registered", body = JoinResponse),
        (status = 400, description = "Invalid nickname")
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    Ok(Json(player_service::join(&state, session_id, payload).await?))
}

/// Press the buzzer for the current question.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/buzz",
    tag = "player",
    params(("session_id" = Uuid, Path, description = "Session the player is in")),
    request_body = BuzzRequest,
    responses(
        (status = 200, description = "Press recorded or softly rejected", body = BuzzResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn buzz(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<BuzzRequest>,
) -> Result<Json<BuzzResponse>, AppError> {
    Ok(Json(player_service::buzz(&state, session_id, payload).await?))
}

/// Submit or change an answer for the current question.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/answers",
    tag = "player",
    params(("session_id" = Uuid, Path, description = "Session the player is in")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded or softly rejected", body = AnswerResponse),
        (status = 404, description = "Unknown player or question")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    Ok(Json(
        player_service::submit_answer(&state, session_id, payload).await?,
    ))
}

/// Mark a player as having spoken for a question. Idempotent.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/spoken",
    tag = "player",
    params(("session_id" = Uuid, Path, description = "Session the player is in")),
    request_body = SpokenRequest,
    responses(
        (status = 200, description = "Mark present", body = SpokenResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn mark_spoken(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SpokenRequest>,
) -> Result<Json<SpokenResponse>, AppError> {
    Ok(Json(
        player_service::mark_spoken(&state, session_id, payload).await?,
    ))
}

/// Per-player results summary joined against the full question bank.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/players/{player_id}/summary",
    tag = "player",
    params(
        ("session_id" = Uuid, Path, description = "Session the player is in"),
        ("player_id" = Uuid, Path, description = "Player to summarize")
    ),
    responses(
        (status = 200, description = "Player summary", body = PlayerSummaryResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player_summary(
    State(state): State<SharedState>,
    Path((session_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerSummaryResponse>, AppError> {
    Ok(Json(
        snapshot_service::get_player_summary(&state, session_id, player_id).await?,
    ))
}
