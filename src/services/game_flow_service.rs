//! Moderator-driven game flow: every transition is a read of the current
//! state, a pure transition-table check, and a single compare-and-swap
//! commit that also clears the right ledger scope. Two moderators racing
//! the same transition resolve through the version check, not a lock.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::GameStateEntity,
        quiz_store::{ClearScope, CommitOutcome, QuizStore},
    },
    dto::admin::{AdvanceRequest, TransitionResponse},
    error::ServiceError,
    state::{
        SharedState,
        machine::{self, GameEvent, GamePhase},
    },
};

/// Start the game at question zero, clearing every ledger scope.
pub async fn start_game(
    state: &SharedState,
    session: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let current = load_state(&store, session).await?;
    let next = apply(current.phase, GameEvent::Start)?;

    if store.list_questions(session).await?.is_empty() {
        return Err(ServiceError::Validation(
            "cannot start a game with an empty question set".into(),
        ));
    }

    let mut target = current.clone();
    target.game_started = true;
    target.phase = next;
    target.current_question_index = 0;
    target.first_buzzer_player_id = None;
    target.buzz_locked = false;

    let response = commit(
        &store,
        session,
        current.version,
        target,
        ClearScope::AllEvents,
    )
    .await?;
    info!(%session, "game started");
    Ok(response)
}

/// Show the answer options for the current question. Buzzers recorded so
/// far stay visible for reference.
pub async fn show_options(
    state: &SharedState,
    session: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let current = load_state(&store, session).await?;
    let next = apply(current.phase, GameEvent::ShowOptions)?;

    let mut target = current.clone();
    target.phase = next;

    commit(&store, session, current.version, target, ClearScope::None).await
}

/// Reveal the correct answer for the current question.
pub async fn reveal(
    state: &SharedState,
    session: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let current = load_state(&store, session).await?;
    let next = apply(current.phase, GameEvent::Reveal)?;

    let mut target = current.clone();
    target.phase = next;

    commit(&store, session, current.version, target, ClearScope::None).await
}

/// Move to the next question, or finish the game when none remain.
///
/// This is the one transition where the caller supplies the expected
/// version: duplicate or concurrent advance requests would otherwise skip
/// questions, so a stale token is rejected with the current version.
pub async fn advance(
    state: &SharedState,
    session: Uuid,
    request: AdvanceRequest,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let current = load_state(&store, session).await?;

    let question_count = store.list_questions(session).await?.len();
    let has_more = current.current_question_index + 1 < question_count;
    let event = if has_more {
        GameEvent::Advance
    } else {
        GameEvent::Finish
    };
    let next = apply(current.phase, event)?;

    let mut target = current.clone();
    target.phase = next;
    target.first_buzzer_player_id = None;
    target.buzz_locked = false;

    let clear = if has_more {
        target.current_question_index = current.current_question_index + 1;
        // Only the incoming question's scope: history for played questions
        // stays available to the player summaries.
        ClearScope::Question(target.current_question_index)
    } else {
        target.game_started = false;
        ClearScope::None
    };

    let response = commit(&store, session, request.expected_version, target, clear).await?;
    debug!(
        %session,
        question = response.current_question_index,
        finished = !has_more,
        "advanced"
    );
    Ok(response)
}

/// Return to waiting, keeping players and questions.
pub async fn soft_reset(
    state: &SharedState,
    session: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    reset(state, session, false).await
}

/// Return to waiting and drop the player roster as well.
pub async fn full_reset(
    state: &SharedState,
    session: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    reset(state, session, true).await
}

async fn reset(
    state: &SharedState,
    session: Uuid,
    clear_players: bool,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    match store.reset_session(session, clear_players).await? {
        CommitOutcome::Committed { version } => {
            info!(%session, clear_players, "session reset");
            Ok(TransitionResponse {
                phase: GamePhase::Waiting.into(),
                current_question_index: 0,
                version,
            })
        }
        CommitOutcome::Conflict { actual } => {
            Err(ServiceError::VersionConflict { current: actual })
        }
        CommitOutcome::SessionMissing => {
            Err(ServiceError::NotFound(format!("session `{session}` not found")))
        }
    }
}

async fn load_state(
    store: &Arc<dyn QuizStore>,
    session: Uuid,
) -> Result<GameStateEntity, ServiceError> {
    store
        .load_game_state(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))
}

fn apply(phase: GamePhase, event: GameEvent) -> Result<GamePhase, ServiceError> {
    machine::next_phase(phase, event).map_err(|err| ServiceError::InvalidPhase { phase: err.from })
}

async fn commit(
    store: &Arc<dyn QuizStore>,
    session: Uuid,
    expected_version: u64,
    target: GameStateEntity,
    clear: ClearScope,
) -> Result<TransitionResponse, ServiceError> {
    let phase = target.phase;
    let current_question_index = target.current_question_index;

    match store
        .commit_game_state(session, Some(expected_version), target, clear)
        .await?
    {
        CommitOutcome::Committed { version } => Ok(TransitionResponse {
            phase: phase.into(),
            current_question_index,
            version,
        }),
        CommitOutcome::Conflict { actual } => {
            Err(ServiceError::VersionConflict { current: actual })
        }
        CommitOutcome::SessionMissing => {
            Err(ServiceError::NotFound(format!("session `{session}` not found")))
        }
    }
}
