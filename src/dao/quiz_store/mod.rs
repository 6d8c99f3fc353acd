//! Storage abstraction for quiz sessions.
//!
//! Every method is a single atomic transaction against the backing store.
//! Outcomes that are expected under concurrent load (duplicate buzz, stale
//! version) are modelled as typed `Ok` values so the error channel stays
//! reserved for genuine storage faults.

pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEventEntity, BuzzerEventEntity, GameStateEntity, PlayerEntity, QuestionEntity,
    SessionMetaEntity, SessionSnapshotEntity, SnapshotListItemEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::machine::GamePhase;

/// Event scope cleared atomically with a committed game-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Keep all ledger rows.
    None,
    /// Clear buzzer/answer/spoken rows for a single question.
    Question(usize),
    /// Clear all ledger rows for the session.
    AllEvents,
}

/// Result of a compare-and-swap commit of the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The transition committed; `version` is the new counter value.
    Committed {
        /// Version after the commit.
        version: u64,
    },
    /// The stored version differed from the expected one; nothing changed.
    Conflict {
        /// Version currently stored.
        actual: u64,
    },
    /// The session does not exist.
    SessionMissing,
}

/// Result of registering a player by nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new player row was created.
    Joined(PlayerEntity),
    /// The nickname already existed; the original row is returned.
    Rejoined(PlayerEntity),
}

/// Result of an atomic buzzer insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// The press was recorded.
    Accepted {
        /// Monotonic timestamp captured inside the transaction.
        timestamp_micros: u64,
        /// True when this press was the first for the question.
        first: bool,
    },
    /// The player already has a buzzer row for this question.
    AlreadyBuzzed,
    /// Buzzing is not legal in the session's current phase, or the request
    /// targets a question that is not the current one.
    InvalidPhase {
        /// Phase the session was actually in.
        phase: GamePhase,
    },
    /// The player is not registered in the session.
    UnknownPlayer,
}

/// Result of an atomic answer upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was written (insert or overwrite).
    Recorded {
        /// Correctness recomputed at write time.
        is_correct: bool,
        /// Text of the correct option, echoed back to the player.
        correct_text: String,
        /// True when a previous answer was overwritten.
        updated: bool,
    },
    /// Answering is not legal in the session's current phase, or the request
    /// targets a question that is not the current one.
    InvalidPhase {
        /// Phase the session was actually in.
        phase: GamePhase,
    },
    /// The player is not registered in the session.
    UnknownPlayer,
    /// The question index does not exist in the bank.
    QuestionNotFound,
    /// The chosen option index is outside the question's option list.
    AnswerOutOfRange {
        /// Number of options the question has.
        options: usize,
    },
}

/// Result of an idempotent spoken-mark insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpokenOutcome {
    /// The mark is present (`newly` tells whether this call inserted it).
    Marked {
        /// False when the mark already existed.
        newly: bool,
    },
    /// Marking is not legal outside an active question phase.
    InvalidPhase {
        /// Phase the session was actually in.
        phase: GamePhase,
    },
    /// The player is not registered in the session.
    UnknownPlayer,
}

/// Abstraction over the persistence layer for quiz sessions.
///
/// Implementations must guarantee that each method executes atomically with
/// respect to every other method call on the same session, that buzzer
/// uniqueness is enforced by the store itself, and that lock waits are
/// bounded (returning [`crate::dao::storage::StorageError::Busy`] instead of
/// blocking indefinitely).
pub trait QuizStore: Send + Sync {
    /// Create a session with a fresh id and initial game state.
    fn create_session(
        &self,
        name: String,
        notes: Option<String>,
    ) -> BoxFuture<'static, StorageResult<SessionMetaEntity>>;

    /// Initialize the session if absent. Returns true when it was created.
    fn ensure_session(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Whether the session exists.
    fn session_exists(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Metadata for a single session.
    fn find_session(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionMetaEntity>>>;

    /// All sessions, ordered by creation time.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionMetaEntity>>>;

    /// Delete a session and everything it owns. Returns false when absent.
    fn delete_session(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Load the session's game state together with its version.
    fn load_game_state(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;

    /// Commit a game-state transition with an optimistic version check.
    ///
    /// The store bumps the version itself (the `version` field of `state` is
    /// ignored) and clears the requested event scope within the same
    /// transaction. With `expected_version == None` the commit is
    /// unconditional, still bumping the version.
    fn commit_game_state(
        &self,
        session: Uuid,
        expected_version: Option<u64>,
        state: GameStateEntity,
        clear: ClearScope,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>>;

    /// Reset the session to the waiting state.
    ///
    /// Clears all ledger rows; with `clear_players` the player roster is
    /// dropped as well and the version counter restarts at 1. Without it the
    /// version is bumped like any other transition.
    fn reset_session(
        &self,
        session: Uuid,
        clear_players: bool,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>>;

    /// Register a player by nickname, idempotently. Returns `None` when the
    /// session does not exist.
    fn join_player(
        &self,
        session: Uuid,
        nickname: String,
    ) -> BoxFuture<'static, StorageResult<Option<JoinOutcome>>>;

    /// Find a player by id.
    fn find_player(
        &self,
        session: Uuid,
        player: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;

    /// All players in join order.
    fn list_players(&self, session: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;

    /// Atomically replace the whole question bank, dropping ledger rows
    /// recorded against the previous set. Returns false when the session
    /// does not exist.
    fn replace_questions(
        &self,
        session: Uuid,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Full question bank in order.
    fn list_questions(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Record a buzzer press for the current question.
    ///
    /// The phase guard, the player check, the uniqueness constraint, the
    /// timestamp read, and the `first_buzzer_player_id` bookkeeping all
    /// happen inside one transaction — this is the primitive that decides
    /// "who buzzed first" under concurrent load.
    fn record_buzzer(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<BuzzOutcome>>;

    /// Buzzer presses for a question, ascending by `(timestamp, seq)`.
    fn list_buzzers(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<BuzzerEventEntity>>>;

    /// Upsert an answer for the current question, recomputing correctness.
    fn record_answer(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
        answer_index: usize,
    ) -> BoxFuture<'static, StorageResult<AnswerOutcome>>;

    /// Answers for a question, in first-submission order.
    fn list_answers(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEventEntity>>>;

    /// All answers a player has on record, ascending by question index.
    fn list_answers_for_player(
        &self,
        session: Uuid,
        player: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEventEntity>>>;

    /// Idempotently mark a player as having spoken for a question.
    fn mark_spoken(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<SpokenOutcome>>;

    /// Players marked as spoken for a question. No ordering guarantee.
    fn list_spoken(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Persist a named full export of a session.
    fn save_snapshot(
        &self,
        snapshot: SessionSnapshotEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Load a named export.
    fn load_snapshot(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionSnapshotEntity>>>;

    /// List saved exports, most recent first.
    fn list_snapshots(&self) -> BoxFuture<'static, StorageResult<Vec<SnapshotListItemEntity>>>;

    /// Delete a named export. Returns false when absent.
    fn delete_snapshot(&self, name: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Atomically overwrite a session's state, questions, and players from a
    /// restored export, clearing all ledger rows.
    fn restore_session(
        &self,
        session: Uuid,
        state: GameStateEntity,
        questions: Vec<QuestionEntity>,
        players: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Cheap probe used by the health endpoint.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
