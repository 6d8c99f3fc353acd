use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::admin::{
        AdvanceRequest, AnswerStatsResponse, CreateSessionRequest, LoadSessionRequest,
        QuestionsUpdatedResponse, SaveSessionRequest, SessionSummary, SnapshotInfo,
        TransitionResponse, UpdateQuestionsRequest,
    },
    error::AppError,
    services::{game_flow_service, question_service, session_service, snapshot_service},
    state::SharedState,
};

/// Moderator endpoints for managing sessions and driving the game flow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/sessions", get(list_sessions).post(create_session))
        .route(
            "/admin/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/admin/sessions/{id}/game/start", post(start_game))
        .route("/admin/sessions/{id}/game/options", post(show_options))
        .route("/admin/sessions/{id}/game/reveal", post(reveal))
        .route("/admin/sessions/{id}/game/next", post(next_question))
        .route("/admin/sessions/{id}/game/soft-reset", post(soft_reset))
        .route("/admin/sessions/{id}/game/full-reset", post(full_reset))
        .route("/admin/sessions/{id}/questions", put(update_questions))
        .route(
            "/admin/sessions/{id}/questions/{index}/stats",
            get(answer_stats),
        )
        .route("/admin/sessions/{id}/save", post(save_session))
        .route("/admin/sessions/{id}/load", post(load_session))
        .route("/admin/snapshots", get(list_snapshots))
        .route("/admin/snapshots/{name}", delete(delete_snapshot))
}

/// List all known sessions.
#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "admin",
    responses((status = 200, description = "Known sessions", body = [SessionSummary]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(session_service::list_sessions(&state).await?))
}

/// Create a named session.
#[utoipa::path(
    post,
    path = "/admin/sessions",
    tag = "admin",
    request_body = CreateSessionRequest,
    responses((status = 200, description = "Session created", body = SessionSummary))
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::create_session(&state, payload).await?))
}

/// Retrieve a session by id (explicit exists-check).
#[utoipa::path(
    get,
    path = "/admin/sessions/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to retrieve")),
    responses(
        (status = 200, description = "Session metadata", body = SessionSummary),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

/// Delete a session and everything it owns.
#[utoipa::path(
    delete,
    path = "/admin/sessions/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to delete")),
    responses((status = 204, description = "Session deleted"))
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::delete_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start the game at question zero.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/start",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to start")),
    responses(
        (status = 200, description = "Game started", body = TransitionResponse),
        (status = 409, description = "Not legal in the current phase")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::start_game(&state, id).await?))
}

/// Show the answer options for the current question.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/options",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to drive")),
    responses(
        (status = 200, description = "Options shown", body = TransitionResponse),
        (status = 409, description = "Not legal in the current phase")
    )
)]
pub async fn show_options(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::show_options(&state, id).await?))
}

/// Reveal the correct answer for the current question.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/reveal",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to drive")),
    responses(
        (status = 200, description = "Answer revealed", body = TransitionResponse),
        (status = 409, description = "Not legal in the current phase")
    )
)]
pub async fn reveal(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::reveal(&state, id).await?))
}

/// Move to the next question (or finish), guarded by the expected version.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/next",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to drive")),
    request_body = AdvanceRequest,
    responses(
        (status = 200, description = "Advanced", body = TransitionResponse),
        (status = 409, description = "Stale version or illegal phase; the body carries the current version")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::advance(&state, id, payload).await?))
}

/// Return to waiting, keeping players and questions.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/soft-reset",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to reset")),
    responses((status = 200, description = "Session reset", body = TransitionResponse))
)]
pub async fn soft_reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::soft_reset(&state, id).await?))
}

/// Return to waiting and drop the player roster as well.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/game/full-reset",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to reset")),
    responses((status = 200, description = "Session reset", body = TransitionResponse))
)]
pub async fn full_reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(game_flow_service::full_reset(&state, id).await?))
}

/// Atomically replace the session's question set.
#[utoipa::path(
    put,
    path = "/admin/sessions/{id}/questions",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to update")),
    request_body = UpdateQuestionsRequest,
    responses(
        (status = 200, description = "Question set replaced", body = QuestionsUpdatedResponse),
        (status = 400, description = "Validation failed; nothing was applied")
    )
)]
pub async fn update_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionsRequest>,
) -> Result<Json<QuestionsUpdatedResponse>, AppError> {
    Ok(Json(
        question_service::replace_questions(&state, id, payload).await?,
    ))
}

/// Answer progress for one question.
#[utoipa::path(
    get,
    path = "/admin/sessions/{id}/questions/{index}/stats",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Session to inspect"),
        ("index" = usize, Path, description = "Question index")
    ),
    responses(
        (status = 200, description = "Answer statistics", body = AnswerStatsResponse),
        (status = 404, description = "Question not found")
    )
)]
pub async fn answer_stats(
    State(state): State<SharedState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<AnswerStatsResponse>, AppError> {
    Ok(Json(
        snapshot_service::get_answer_stats(&state, id, index).await?,
    ))
}

/// Save the session's full state under a snapshot name.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/save",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to export")),
    request_body = SaveSessionRequest,
    responses((status = 200, description = "Snapshot saved", body = SnapshotInfo))
)]
pub async fn save_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveSessionRequest>,
) -> Result<Json<SnapshotInfo>, AppError> {
    Ok(Json(session_service::save_session(&state, id, payload).await?))
}

/// Restore a saved snapshot into the session.
#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/load",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Session to restore into")),
    request_body = LoadSessionRequest,
    responses(
        (status = 200, description = "Snapshot restored", body = SessionSummary),
        (status = 404, description = "Snapshot not found")
    )
)]
pub async fn load_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LoadSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::load_session(&state, id, payload).await?))
}

/// List saved snapshots.
#[utoipa::path(
    get,
    path = "/admin/snapshots",
    tag = "admin",
    responses((status = 200, description = "Saved snapshots", body = [SnapshotInfo]))
)]
pub async fn list_snapshots(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SnapshotInfo>>, AppError> {
    Ok(Json(session_service::list_snapshots(&state).await?))
}

/// Delete a saved snapshot.
#[utoipa::path(
    delete,
    path = "/admin/snapshots/{name}",
    tag = "admin",
    params(("name" = String, Path, description = "Snapshot to delete")),
    responses((status = 204, description = "Snapshot deleted"))
)]
pub async fn delete_snapshot(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    session_service::delete_snapshot(&state, name).await?;
    Ok(StatusCode::NO_CONTENT)
}
