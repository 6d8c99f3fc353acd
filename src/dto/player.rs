//! DTO definitions for the player-facing REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_nickname;

/// Payload sent by a player joining a session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Nickname to register; joining again with the same nickname returns
    /// the existing player id.
    pub nickname: String,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_nickname(&self.nickname) {
            errors.add("nickname", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response to a join request.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub player_id: Uuid,
    pub nickname: String,
    /// True when the nickname was already registered and the id was reused.
    pub existing: bool,
}

/// Reason a buzz, answer, or spoken mark was softly rejected.
///
/// These rejections are expected during normal gameplay (races, stale
/// clients) and come back with a 200 status so the frontend can show an
/// inline message instead of an error page.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The player already buzzed for this question.
    AlreadyBuzzed,
    /// The operation is not legal in the current phase (or the client's
    /// question index is stale).
    InvalidPhase,
}

/// Payload for a buzzer press.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BuzzRequest {
    pub player_id: Uuid,
    /// Question the client believes is current; a stale value is rejected.
    pub question_index: usize,
}

/// Response to a buzzer press.
#[derive(Debug, Serialize, ToSchema)]
pub struct BuzzResponse {
    /// Whether the press was recorded.
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// True when this press was the first for the question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<bool>,
}

/// Payload for an answer submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub player_id: Uuid,
    /// Question the client believes is current; a stale value is rejected.
    pub question_index: usize,
    /// Index of the chosen option.
    pub answer_index: usize,
}

/// Response to an answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Whether the answer was recorded.
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Correctness of the submitted answer, present when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Text of the correct option, present when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer_text: Option<String>,
}

/// Payload marking a player as having spoken for a question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SpokenRequest {
    pub player_id: Uuid,
    pub question_index: usize,
}

/// Response to a spoken mark. The operation is idempotent.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpokenResponse {
    /// Whether the mark is present after this call.
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

/// One line of a player's end-of-game breakdown. Every question appears,
/// answered or not.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryLine {
    pub question_index: usize,
    pub question: String,
    /// Text of the option the player chose, absent when unanswered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_answer_text: Option<String>,
    pub correct_answer_text: String,
    /// Absent when unanswered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Per-player result summary computed from the answer ledger.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummaryResponse {
    pub player_id: Uuid,
    pub nickname: String,
    pub total_questions: usize,
    pub answered_count: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    /// Indexes of questions the player never answered.
    pub unanswered: Vec<usize>,
    pub breakdown: Vec<SummaryLine>,
}
