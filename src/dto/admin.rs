//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{SessionMetaEntity, SnapshotListItemEntity},
    dto::{format_system_time, phase::VisiblePhase},
};

/// Payload to create a named session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Optional free-form moderator notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Session metadata returned to administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<SessionMetaEntity> for SessionSummary {
    fn from(meta: SessionMetaEntity) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            notes: meta.notes,
            created_at: format_system_time(meta.created_at),
        }
    }
}

/// Result of a committed game-flow transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub phase: VisiblePhase,
    pub current_question_index: usize,
    /// Version after the commit; clients use it for the next advance.
    pub version: u64,
}

/// Payload for moving to the next question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceRequest {
    /// Version the moderator last observed. A stale value means another
    /// request already advanced the game; the response carries the current
    /// version so the client can refetch.
    pub expected_version: u64,
}

/// Incoming question definition for a question-set replacement.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1))]
    pub text: String,
    /// Answer options; at least two are required.
    #[validate(length(min = 2))]
    pub options: Vec<String>,
    /// Position of the correct option in `options`.
    pub correct_index: usize,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Payload replacing a session's entire question set. The replacement is
/// atomic: any invalid question rejects the whole batch.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateQuestionsRequest {
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Result of a question-set replacement.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsUpdatedResponse {
    /// Number of questions now in the bank.
    pub count: usize,
}

/// Moderator-facing answer progress for one question.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerStatsResponse {
    pub question_index: usize,
    pub answered_count: usize,
    pub active_player_count: usize,
    /// True only when at least one active player exists and all of them
    /// have an answer on record.
    pub all_answered: bool,
    pub answered_names: Vec<String>,
    pub not_answered_names: Vec<String>,
}

/// Payload to save the session under a snapshot name.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SaveSessionRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Notes stored with the export, defaulting to the session's own.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload to restore a saved snapshot into a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoadSessionRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
}

/// Saved snapshot as listed for administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotInfo {
    pub name: String,
    pub saved_at: String,
    pub session_name: String,
    pub question_count: usize,
    pub player_count: usize,
}

impl From<SnapshotListItemEntity> for SnapshotInfo {
    fn from(item: SnapshotListItemEntity) -> Self {
        Self {
            name: item.name,
            saved_at: format_system_time(item.saved_at),
            session_name: item.session_name,
            question_count: item.question_count,
            player_count: item.player_count,
        }
    }
}
