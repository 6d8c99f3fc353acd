//! Player-facing operations: joining a session, buzzing, answering, and
//! spoken marks. Race arbitration lives in the store; this layer maps
//! outcomes onto wire responses.

use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::quiz_store::{AnswerOutcome, BuzzOutcome, JoinOutcome, SpokenOutcome},
    dto::player::{
        AnswerRequest, AnswerResponse, BuzzRequest, BuzzResponse, JoinRequest, JoinResponse,
        RejectReason, SpokenRequest, SpokenResponse,
    },
    error::ServiceError,
    services::session_service,
    state::SharedState,
};

/// Join a session by nickname, creating the session on first reference.
///
/// Joining with a nickname that is already taken returns the existing
/// player's id, so a player whose browser reloaded keeps their identity.
pub async fn join(
    state: &SharedState,
    session: Uuid,
    request: JoinRequest,
) -> Result<JoinResponse, ServiceError> {
    request.validate()?;
    let nickname = request.nickname.trim().to_string();

    session_service::ensure_session(state, session).await?;
    let store = state.require_quiz_store().await?;

    let outcome = store
        .join_player(session, nickname)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;

    let response = match outcome {
        JoinOutcome::Joined(player) => JoinResponse {
            player_id: player.id,
            nickname: player.nickname,
            existing: false,
        },
        JoinOutcome::Rejoined(player) => JoinResponse {
            player_id: player.id,
            nickname: player.nickname,
            existing: true,
        },
    };

    debug!(%session, player = %response.player_id, existing = response.existing, "player joined");
    Ok(response)
}

/// Press the buzzer for the current question.
///
/// The store enforces the phase guard and the one-press-per-player rule
/// atomically; expected rejections come back as a soft response rather than
/// an error so clients can show an inline hint.
pub async fn buzz(
    state: &SharedState,
    session: Uuid,
    request: BuzzRequest,
) -> Result<BuzzResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let outcome = store
        .record_buzzer(session, request.player_id, request.question_index)
        .await?;

    match outcome {
        BuzzOutcome::Accepted { first, .. } => Ok(BuzzResponse {
            accepted: true,
            reason: None,
            first: Some(first),
        }),
        BuzzOutcome::AlreadyBuzzed => Ok(BuzzResponse {
            accepted: false,
            reason: Some(RejectReason::AlreadyBuzzed),
            first: None,
        }),
        BuzzOutcome::InvalidPhase { phase } => {
            debug!(%session, player = %request.player_id, ?phase, "buzz rejected by phase guard");
            Ok(BuzzResponse {
                accepted: false,
                reason: Some(RejectReason::InvalidPhase),
                first: None,
            })
        }
        BuzzOutcome::UnknownPlayer => Err(ServiceError::UnknownPlayer),
    }
}

/// Submit (or change) an answer for the current question.
pub async fn submit_answer(
    state: &SharedState,
    session: Uuid,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let outcome = store
        .record_answer(
            session,
            request.player_id,
            request.question_index,
            request.answer_index,
        )
        .await?;

    match outcome {
        AnswerOutcome::Recorded {
            is_correct,
            correct_text,
            updated,
        } => {
            debug!(
                %session,
                player = %request.player_id,
                question = request.question_index,
                updated,
                "answer recorded"
            );
            Ok(AnswerResponse {
                accepted: true,
                reason: None,
                is_correct: Some(is_correct),
                correct_answer_text: Some(correct_text),
            })
        }
        AnswerOutcome::InvalidPhase { .. } => Ok(AnswerResponse {
            accepted: false,
            reason: Some(RejectReason::InvalidPhase),
            is_correct: None,
            correct_answer_text: None,
        }),
        AnswerOutcome::UnknownPlayer => Err(ServiceError::UnknownPlayer),
        AnswerOutcome::QuestionNotFound => Err(ServiceError::QuestionNotFound {
            index: request.question_index,
        }),
        AnswerOutcome::AnswerOutOfRange { options } => Err(ServiceError::Validation(format!(
            "answer_index {} is out of range for {} options",
            request.answer_index, options
        ))),
    }
}

/// Idempotently mark a player as having spoken for a question.
pub async fn mark_spoken(
    state: &SharedState,
    session: Uuid,
    request: SpokenRequest,
) -> Result<SpokenResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let outcome = store
        .mark_spoken(session, request.player_id, request.question_index)
        .await?;

    match outcome {
        SpokenOutcome::Marked { newly } => {
            if newly {
                debug!(%session, player = %request.player_id, question = request.question_index, "spoken mark set");
            }
            Ok(SpokenResponse {
                marked: true,
                reason: None,
            })
        }
        SpokenOutcome::InvalidPhase { .. } => Ok(SpokenResponse {
            marked: false,
            reason: Some(RejectReason::InvalidPhase),
        }),
        SpokenOutcome::UnknownPlayer => Err(ServiceError::UnknownPlayer),
    }
}
