//! Session registry operations and named save/load exports.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PlayerEntity, SessionSnapshotEntity},
    dto::admin::{
        CreateSessionRequest, LoadSessionRequest, SaveSessionRequest, SessionSummary, SnapshotInfo,
    },
    error::ServiceError,
    services::question_service,
    state::SharedState,
};

/// Create a named session with fresh state.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    request.validate()?;

    let store = state.require_quiz_store().await?;
    let meta = store.create_session(request.name, request.notes).await?;
    seed_default_questions(state, meta.id).await?;

    info!(session = %meta.id, "session created");
    Ok(meta.into())
}

/// Initialize the session if it does not exist yet.
///
/// Sessions come into being on first reference: polling an unseen id or
/// joining it creates the session with default state and, when configured,
/// the default question set.
pub async fn ensure_session(state: &SharedState, session: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    if store.ensure_session(session).await? {
        seed_default_questions(state, session).await?;
    }
    Ok(())
}

/// Fetch a single session's metadata, as an explicit exists-check.
pub async fn get_session(
    state: &SharedState,
    session: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let store = state.require_quiz_store().await?;
    let meta = store
        .find_session(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;
    Ok(meta.into())
}

/// All known sessions in creation order.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<SessionSummary>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let sessions = store.list_sessions().await?;
    Ok(sessions.into_iter().map(Into::into).collect())
}

/// Delete a session and everything it owns.
pub async fn delete_session(state: &SharedState, session: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    if store.delete_session(session).await? {
        info!(%session, "session deleted");
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("session `{session}` not found")))
    }
}

/// Export the session's full state under a snapshot name.
pub async fn save_session(
    state: &SharedState,
    session: Uuid,
    request: SaveSessionRequest,
) -> Result<SnapshotInfo, ServiceError> {
    request.validate()?;

    let store = state.require_quiz_store().await?;
    let meta = store
        .find_session(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;
    let game_state = store
        .load_game_state(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;

    let snapshot = SessionSnapshotEntity {
        name: request.name,
        saved_at: SystemTime::now(),
        session_id: session,
        session_name: meta.name,
        notes: request.notes.or(meta.notes),
        game_state,
        questions: store.list_questions(session).await?,
        players: store.list_players(session).await?,
    };

    let info = SnapshotInfo::from(crate::dao::models::SnapshotListItemEntity::from(&snapshot));
    store.save_snapshot(snapshot).await?;
    info!(%session, name = %info.name, "session saved");
    Ok(info)
}

/// Restore a saved snapshot into the given session.
///
/// Player ids are regenerated (restored players are new rows), but the
/// nickname sequence and the question bank are reproduced exactly. The
/// questions are written as exported — no re-shuffle, so a save/load pair
/// round-trips losslessly.
pub async fn load_session(
    state: &SharedState,
    session: Uuid,
    request: LoadSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    request.validate()?;

    let store = state.require_quiz_store().await?;
    let snapshot = store
        .load_snapshot(request.name.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("snapshot `{}` not found", request.name)))?;

    let players: Vec<PlayerEntity> = snapshot
        .players
        .into_iter()
        .map(|player| PlayerEntity {
            id: Uuid::new_v4(),
            ..player
        })
        .collect();

    store.ensure_session(session).await?;
    store
        .restore_session(session, snapshot.game_state, snapshot.questions, players)
        .await?;

    info!(%session, name = %request.name, "session restored from snapshot");
    get_session(state, session).await
}

/// List saved snapshots, most recent first.
pub async fn list_snapshots(state: &SharedState) -> Result<Vec<SnapshotInfo>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let items = store.list_snapshots().await?;
    Ok(items.into_iter().map(Into::into).collect())
}

/// Delete a saved snapshot by name.
pub async fn delete_snapshot(state: &SharedState, name: String) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    if store.delete_snapshot(name.clone()).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("snapshot `{name}` not found")))
    }
}

async fn seed_default_questions(state: &SharedState, session: Uuid) -> Result<(), ServiceError> {
    let seeds = state.config().default_questions();
    if seeds.is_empty() {
        return Ok(());
    }

    match question_service::entities_from_seeds(seeds) {
        Ok(questions) => {
            let store = state.require_quiz_store().await?;
            store.replace_questions(session, questions).await?;
        }
        Err(err) => {
            // A broken default set should not make session creation fail;
            // the moderator can still upload questions explicitly.
            warn!(%session, error = %err, "skipping invalid default question set");
        }
    }
    Ok(())
}
