//! Snapshot DTOs served to polling clients (admin and player frontends).

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{BuzzerEventEntity, GameStateEntity, PlayerEntity, QuestionEntity},
    dto::{format_system_time, phase::VisiblePhase},
    state::machine::GamePhase,
};

/// Projection of the session's game state.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStateView {
    pub phase: VisiblePhase,
    pub game_started: bool,
    pub current_question_index: usize,
    /// Player that buzzed first for the current question, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_buzzer_player_id: Option<Uuid>,
    pub buzz_locked: bool,
    pub last_updated_at: String,
    /// Optimistic-concurrency token; pass back as `expected_version` when
    /// advancing to the next question.
    pub version: u64,
}

impl From<&GameStateEntity> for GameStateView {
    fn from(state: &GameStateEntity) -> Self {
        Self {
            phase: state.phase.into(),
            game_started: state.game_started,
            current_question_index: state.current_question_index,
            first_buzzer_player_id: state.first_buzzer_player_id,
            buzz_locked: state.buzz_locked,
            last_updated_at: format_system_time(state.last_updated_at),
            version: state.version,
        }
    }
}

/// Projection of the current question.
///
/// The answer key and explanation stay hidden until the reveal so the same
/// snapshot can be polled by players and the moderator alike.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Present from the reveal phase onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    /// Present from the reveal phase onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionView {
    /// Build the view, disclosing the answer key only once `phase` has
    /// reached the reveal.
    pub fn for_phase(question: &QuestionEntity, phase: GamePhase) -> Self {
        let disclosed = matches!(phase, GamePhase::Reveal | GamePhase::Finished);
        Self {
            index: question.index,
            text: question.text.clone(),
            options: question.options.clone(),
            image_ref: question.image_ref.clone(),
            correct_index: disclosed.then_some(question.correct_index),
            explanation: disclosed
                .then(|| question.explanation.clone())
                .flatten(),
        }
    }
}

/// One accepted buzzer press, ordered ascending by timestamp.
#[derive(Debug, Serialize, ToSchema)]
pub struct BuzzerView {
    pub player_id: Uuid,
    pub nickname: String,
    pub timestamp_micros: u64,
}

impl BuzzerView {
    /// Attach the nickname resolved from the player roster.
    pub fn new(event: &BuzzerEventEntity, nickname: String) -> Self {
        Self {
            player_id: event.player_id,
            nickname,
            timestamp_micros: event.timestamp_micros,
        }
    }
}

/// One submitted answer for the current question.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerView {
    pub player_id: Uuid,
    pub nickname: String,
    pub answer_index: usize,
    pub is_correct: bool,
}

/// Player roster entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerView {
    pub id: Uuid,
    pub nickname: String,
    pub joined_at: String,
    pub active: bool,
}

impl From<&PlayerEntity> for PlayerView {
    fn from(player: &PlayerEntity) -> Self {
        Self {
            id: player.id,
            nickname: player.nickname.clone(),
            joined_at: format_system_time(player.joined_at),
            active: player.active,
        }
    }
}

/// Full polled state for one session: everything the frontends need to
/// render the current moment of the game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub session_id: Uuid,
    pub state: GameStateView,
    /// Current question, absent while waiting or when the bank is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub question_count: usize,
    /// Buzzer presses for the current question, first press first.
    pub buzzers: Vec<BuzzerView>,
    /// Answers for the current question.
    pub answers: Vec<AnswerView>,
    /// Players marked as spoken for the current question.
    pub spoken_players: Vec<Uuid>,
    pub players: Vec<PlayerView>,
}
