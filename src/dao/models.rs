use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::machine::GamePhase;

/// Metadata identifying a quiz session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionMetaEntity {
    /// Stable identifier for the session.
    pub id: Uuid,
    /// Human readable session name.
    pub name: String,
    /// Free-form moderator notes attached to the session.
    pub notes: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}

/// Per-session game flow state persisted by the storage layer.
///
/// `version` is the optimistic-concurrency token: it starts at 1, advances
/// exactly once per committed transition, and never moves backwards except
/// when the whole session is reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Whether a game is currently in progress.
    pub game_started: bool,
    /// Index of the question currently being played.
    pub current_question_index: usize,
    /// Current step of the question flow.
    pub phase: GamePhase,
    /// Player that buzzed first for the current question, if any.
    pub first_buzzer_player_id: Option<Uuid>,
    /// True once a buzz has been accepted for the current question.
    pub buzz_locked: bool,
    /// Last time a transition was committed.
    pub last_updated_at: SystemTime,
    /// Monotonic version counter, bumped on every committed transition.
    pub version: u64,
}

impl GameStateEntity {
    /// Fresh state for a newly created or fully reset session.
    pub fn initial() -> Self {
        Self {
            game_started: false,
            current_question_index: 0,
            phase: GamePhase::Waiting,
            first_buzzer_player_id: None,
            buzz_locked: false,
            last_updated_at: SystemTime::now(),
            version: 1,
        }
    }
}

/// Player registered in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Server-generated identifier, stable for the session lifetime.
    pub id: Uuid,
    /// Nickname, unique within the session.
    pub nickname: String,
    /// When the player first joined.
    pub joined_at: SystemTime,
    /// Whether the player currently counts towards answer statistics.
    pub active: bool,
}

/// Multiple-choice question stored in a session's question bank.
///
/// `correct_text` is a denormalized copy of the correct option's text taken
/// at write time. It exists so the shuffled `correct_index` can be verified
/// against the text it is supposed to point at, and recomputed from it if
/// the two ever disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Contiguous 0-based position in the question list.
    pub index: usize,
    /// Question text.
    pub text: String,
    /// Answer options in display order (at least two).
    pub options: Vec<String>,
    /// Position of the correct option within `options`.
    pub correct_index: usize,
    /// Audit copy of the correct option's text.
    pub correct_text: String,
    /// Optional reference to an illustration shown with the question.
    pub image_ref: Option<String>,
    /// Optional explanation shown after the reveal.
    pub explanation: Option<String>,
}

impl QuestionEntity {
    /// Resolve the index of the correct option, preferring `correct_index`
    /// but falling back to an exact text match on `correct_text` when the
    /// two disagree (e.g. after a partial schema migration).
    pub fn effective_correct_index(&self) -> Option<usize> {
        match self.options.get(self.correct_index) {
            Some(text) if *text == self.correct_text => Some(self.correct_index),
            _ => self
                .options
                .iter()
                .position(|option| *option == self.correct_text),
        }
    }
}

/// A timestamped buzzer press, unique per `(session, player, question)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuzzerEventEntity {
    /// Player that pressed the buzzer.
    pub player_id: Uuid,
    /// Question the press applies to.
    pub question_index: usize,
    /// Monotonic clock reading captured inside the insert transaction.
    pub timestamp_micros: u64,
    /// Insertion sequence, breaking timestamp ties deterministically.
    pub seq: u64,
}

/// A submitted answer, upsertable until the reveal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEventEntity {
    /// Player that submitted the answer.
    pub player_id: Uuid,
    /// Question the answer applies to.
    pub question_index: usize,
    /// Index of the chosen option.
    pub answer_index: usize,
    /// Whether the chosen option was correct at the moment of write.
    pub is_correct: bool,
    /// Monotonic clock reading of the latest write.
    pub timestamp_micros: u64,
}

/// Serialized full export of a session used for save/load.
///
/// The snapshot must round-trip losslessly: loading it into a fresh session
/// reproduces the question bank and the player nickname sequence exactly
/// (player ids are regenerated on restore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshotEntity {
    /// Name the snapshot was saved under.
    pub name: String,
    /// When the snapshot was taken.
    pub saved_at: SystemTime,
    /// Session the snapshot was taken from.
    pub session_id: Uuid,
    /// Session display name at save time.
    pub session_name: String,
    /// Moderator notes at save time.
    pub notes: Option<String>,
    /// Game flow state at save time.
    pub game_state: GameStateEntity,
    /// Full question bank, in order.
    pub questions: Vec<QuestionEntity>,
    /// Players in join order.
    pub players: Vec<PlayerEntity>,
}

/// Subset of [`SessionSnapshotEntity`] returned when listing saved snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotListItemEntity {
    /// Name the snapshot was saved under.
    pub name: String,
    /// When the snapshot was taken.
    pub saved_at: SystemTime,
    /// Session display name at save time.
    pub session_name: String,
    /// Number of questions in the export.
    pub question_count: usize,
    /// Number of players in the export.
    pub player_count: usize,
}

impl From<&SessionSnapshotEntity> for SnapshotListItemEntity {
    fn from(snapshot: &SessionSnapshotEntity) -> Self {
        Self {
            name: snapshot.name.clone(),
            saved_at: snapshot.saved_at,
            session_name: snapshot.session_name.clone(),
            question_count: snapshot.questions.len(),
            player_count: snapshot.players.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct_index: usize, correct_text: &str) -> QuestionEntity {
        QuestionEntity {
            index: 0,
            text: "q".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            correct_text: correct_text.into(),
            image_ref: None,
            explanation: None,
        }
    }

    #[test]
    fn effective_correct_index_trusts_consistent_data() {
        let q = question(&["a", "b", "c"], 1, "b");
        assert_eq!(q.effective_correct_index(), Some(1));
    }

    #[test]
    fn effective_correct_index_recovers_from_stale_index() {
        let q = question(&["a", "b", "c"], 2, "b");
        assert_eq!(q.effective_correct_index(), Some(1));
    }

    #[test]
    fn effective_correct_index_reports_missing_text() {
        let q = question(&["a", "b"], 0, "gone");
        assert_eq!(q.effective_correct_index(), None);
    }
}
