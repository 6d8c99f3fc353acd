use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEventEntity, BuzzerEventEntity, GameStateEntity, PlayerEntity, QuestionEntity,
    SessionMetaEntity, SessionSnapshotEntity, SnapshotListItemEntity,
};
use crate::dao::quiz_store::{
    AnswerOutcome, BuzzOutcome, ClearScope, CommitOutcome, JoinOutcome, QuizStore, SpokenOutcome,
};
use crate::dao::storage::{StorageError, StorageResult};
use crate::state::machine::GamePhase;

/// Default bound on how long a caller waits for a session's lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(3);

/// Name given to sessions materialized implicitly by `ensure_session`.
const IMPLICIT_SESSION_NAME: &str = "untitled session";

/// Everything the store owns for one session, guarded by one mutex.
struct SessionData {
    meta: SessionMetaEntity,
    state: GameStateEntity,
    players: IndexMap<Uuid, PlayerEntity>,
    questions: Vec<QuestionEntity>,
    buzzers: HashMap<usize, IndexMap<Uuid, BuzzerEventEntity>>,
    answers: HashMap<usize, IndexMap<Uuid, AnswerEventEntity>>,
    spoken: HashMap<usize, HashSet<Uuid>>,
}

impl SessionData {
    fn new(id: Uuid, name: String, notes: Option<String>) -> Self {
        Self {
            meta: SessionMetaEntity {
                id,
                name,
                notes,
                created_at: SystemTime::now(),
            },
            state: GameStateEntity::initial(),
            players: IndexMap::new(),
            questions: Vec::new(),
            buzzers: HashMap::new(),
            answers: HashMap::new(),
            spoken: HashMap::new(),
        }
    }

    fn clear_events(&mut self, scope: ClearScope) {
        match scope {
            ClearScope::None => {}
            ClearScope::Question(index) => {
                self.buzzers.remove(&index);
                self.answers.remove(&index);
                self.spoken.remove(&index);
            }
            ClearScope::AllEvents => {
                self.buzzers.clear();
                self.answers.clear();
                self.spoken.clear();
            }
        }
    }
}

struct StoreInner {
    /// Reference point for monotonic event timestamps.
    epoch: Instant,
    /// Tie-breaker for events recorded within the same clock reading.
    event_seq: AtomicU64,
    busy_timeout: Duration,
    sessions: DashMap<Uuid, Arc<Mutex<SessionData>>>,
    snapshots: Arc<Mutex<IndexMap<String, SessionSnapshotEntity>>>,
}

impl StoreInner {
    /// Acquire the session lock with a bounded wait. `Ok(None)` means the
    /// session does not exist; a timed-out wait surfaces as `Busy`.
    async fn lock_session(
        &self,
        session: Uuid,
        op: &'static str,
    ) -> StorageResult<Option<OwnedMutexGuard<SessionData>>> {
        let Some(slot) = self.sessions.get(&session).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        match timeout(self.busy_timeout, slot.lock_owned()).await {
            Ok(guard) => Ok(Some(guard)),
            Err(_) => Err(StorageError::busy(op)),
        }
    }

    async fn lock_snapshots(
        &self,
        op: &'static str,
    ) -> StorageResult<OwnedMutexGuard<IndexMap<String, SessionSnapshotEntity>>> {
        match timeout(self.busy_timeout, self.snapshots.clone().lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => Err(StorageError::busy(op)),
        }
    }

    fn now_micros(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn next_seq(&self) -> u64 {
        self.event_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert an empty session slot if none exists. Returns true on insert.
    fn materialize_session(&self, session: Uuid) -> bool {
        let mut created = false;
        self.sessions.entry(session).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(SessionData::new(
                session,
                IMPLICIT_SESSION_NAME.to_string(),
                None,
            )))
        });
        created
    }

    fn commit(
        &self,
        data: &mut SessionData,
        expected_version: Option<u64>,
        mut state: GameStateEntity,
        clear: ClearScope,
    ) -> CommitOutcome {
        if let Some(expected) = expected_version {
            if data.state.version != expected {
                return CommitOutcome::Conflict {
                    actual: data.state.version,
                };
            }
        }

        state.version = data.state.version + 1;
        state.last_updated_at = SystemTime::now();
        data.clear_events(clear);
        data.state = state;

        CommitOutcome::Committed {
            version: data.state.version,
        }
    }
}

/// In-memory implementation of [`QuizStore`].
///
/// All mutations on a session are serialized behind its mutex, so each trait
/// method is one atomic transaction; reads go through the same lock and thus
/// always observe the latest committed write.
#[derive(Clone)]
pub struct MemoryQuizStore {
    inner: Arc<StoreInner>,
}

impl MemoryQuizStore {
    /// Create a store with the given bounded lock wait.
    pub fn new(busy_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                epoch: Instant::now(),
                event_seq: AtomicU64::new(0),
                busy_timeout,
                sessions: DashMap::new(),
                snapshots: Arc::new(Mutex::new(IndexMap::new())),
            }),
        }
    }
}

impl Default for MemoryQuizStore {
    fn default() -> Self {
        Self::new(DEFAULT_BUSY_TIMEOUT)
    }
}

impl QuizStore for MemoryQuizStore {
    fn create_session(
        &self,
        name: String,
        notes: Option<String>,
    ) -> BoxFuture<'static, StorageResult<SessionMetaEntity>> {
        let inner = self.inner.clone();
        async move {
            let id = Uuid::new_v4();
            let data = SessionData::new(id, name, notes);
            let meta = data.meta.clone();
            inner.sessions.insert(id, Arc::new(Mutex::new(data)));
            Ok(meta)
        }
        .boxed()
    }

    fn ensure_session(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        async move { Ok(inner.materialize_session(session)) }.boxed()
    }

    fn session_exists(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        async move { Ok(inner.sessions.contains_key(&session)) }.boxed()
    }

    fn find_session(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionMetaEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "find_session").await? else {
                return Ok(None);
            };
            Ok(Some(data.meta.clone()))
        }
        .boxed()
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionMetaEntity>>> {
        let inner = self.inner.clone();
        async move {
            // Collect the slots first so no map guard is held across an await.
            let slots: Vec<Arc<Mutex<SessionData>>> = inner
                .sessions
                .iter()
                .map(|entry| entry.value().clone())
                .collect();

            let mut sessions = Vec::with_capacity(slots.len());
            for slot in slots {
                let guard = match timeout(inner.busy_timeout, slot.lock_owned()).await {
                    Ok(guard) => guard,
                    Err(_) => return Err(StorageError::busy("list_sessions")),
                };
                sessions.push(guard.meta.clone());
            }
            sessions.sort_by_key(|meta| meta.created_at);
            Ok(sessions)
        }
        .boxed()
    }

    fn delete_session(&self, session: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        async move { Ok(inner.sessions.remove(&session).is_some()) }.boxed()
    }

    fn load_game_state(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "load_game_state").await? else {
                return Ok(None);
            };
            Ok(Some(data.state.clone()))
        }
        .boxed()
    }

    fn commit_game_state(
        &self,
        session: Uuid,
        expected_version: Option<u64>,
        state: GameStateEntity,
        clear: ClearScope,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "commit_game_state").await? else {
                return Ok(CommitOutcome::SessionMissing);
            };
            Ok(inner.commit(&mut data, expected_version, state, clear))
        }
        .boxed()
    }

    fn reset_session(
        &self,
        session: Uuid,
        clear_players: bool,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "reset_session").await? else {
                return Ok(CommitOutcome::SessionMissing);
            };

            data.clear_events(ClearScope::AllEvents);
            let mut state = GameStateEntity::initial();
            if clear_players {
                data.players.clear();
            } else {
                // A soft reset is an ordinary transition: the version keeps
                // climbing so pollers never see it move backwards.
                state.version = data.state.version + 1;
            }
            data.state = state;

            Ok(CommitOutcome::Committed {
                version: data.state.version,
            })
        }
        .boxed()
    }

    fn join_player(
        &self,
        session: Uuid,
        nickname: String,
    ) -> BoxFuture<'static, StorageResult<Option<JoinOutcome>>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "join_player").await? else {
                return Ok(None);
            };

            if let Some(existing) = data
                .players
                .values()
                .find(|player| player.nickname == nickname)
            {
                return Ok(Some(JoinOutcome::Rejoined(existing.clone())));
            }

            let player = PlayerEntity {
                id: Uuid::new_v4(),
                nickname,
                joined_at: SystemTime::now(),
                active: true,
            };
            data.players.insert(player.id, player.clone());
            Ok(Some(JoinOutcome::Joined(player)))
        }
        .boxed()
    }

    fn find_player(
        &self,
        session: Uuid,
        player: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "find_player").await? else {
                return Ok(None);
            };
            Ok(data.players.get(&player).cloned())
        }
        .boxed()
    }

    fn list_players(&self, session: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_players").await? else {
                return Ok(Vec::new());
            };
            Ok(data.players.values().cloned().collect())
        }
        .boxed()
    }

    fn replace_questions(
        &self,
        session: Uuid,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "replace_questions").await? else {
                return Ok(false);
            };
            // Ledger rows recorded against the previous set are meaningless
            // for the new one; drop them in the same transaction.
            data.clear_events(ClearScope::AllEvents);
            data.questions = questions;
            Ok(true)
        }
        .boxed()
    }

    fn list_questions(
        &self,
        session: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_questions").await? else {
                return Ok(Vec::new());
            };
            Ok(data.questions.clone())
        }
        .boxed()
    }

    fn record_buzzer(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<BuzzOutcome>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "record_buzzer").await? else {
                return Ok(BuzzOutcome::UnknownPlayer);
            };

            if !data.players.contains_key(&player) {
                return Ok(BuzzOutcome::UnknownPlayer);
            }

            let phase = data.state.phase;
            if phase != GamePhase::QuestionShown
                || question_index != data.state.current_question_index
            {
                return Ok(BuzzOutcome::InvalidPhase { phase });
            }

            let rows = data.buzzers.entry(question_index).or_default();
            if rows.contains_key(&player) {
                return Ok(BuzzOutcome::AlreadyBuzzed);
            }

            let timestamp_micros = inner.now_micros();
            let first = rows.is_empty();
            rows.insert(
                player,
                BuzzerEventEntity {
                    player_id: player,
                    question_index,
                    timestamp_micros,
                    seq: inner.next_seq(),
                },
            );

            if first {
                data.state.first_buzzer_player_id = Some(player);
                data.state.buzz_locked = true;
            }

            Ok(BuzzOutcome::Accepted {
                timestamp_micros,
                first,
            })
        }
        .boxed()
    }

    fn list_buzzers(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<BuzzerEventEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_buzzers").await? else {
                return Ok(Vec::new());
            };
            let mut rows: Vec<BuzzerEventEntity> = data
                .buzzers
                .get(&question_index)
                .map(|rows| rows.values().cloned().collect())
                .unwrap_or_default();
            rows.sort_by_key(|row| (row.timestamp_micros, row.seq));
            Ok(rows)
        }
        .boxed()
    }

    fn record_answer(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
        answer_index: usize,
    ) -> BoxFuture<'static, StorageResult<AnswerOutcome>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "record_answer").await? else {
                return Ok(AnswerOutcome::UnknownPlayer);
            };

            if !data.players.contains_key(&player) {
                return Ok(AnswerOutcome::UnknownPlayer);
            }

            let phase = data.state.phase;
            if phase != GamePhase::OptionsShown
                || question_index != data.state.current_question_index
            {
                return Ok(AnswerOutcome::InvalidPhase { phase });
            }

            let Some(question) = data.questions.get(question_index) else {
                return Ok(AnswerOutcome::QuestionNotFound);
            };

            if answer_index >= question.options.len() {
                return Ok(AnswerOutcome::AnswerOutOfRange {
                    options: question.options.len(),
                });
            }

            let is_correct = answer_index == question.correct_index;
            let correct_text = question.correct_text.clone();
            let timestamp_micros = inner.now_micros();

            let rows = data.answers.entry(question_index).or_default();
            let updated = rows
                .insert(
                    player,
                    AnswerEventEntity {
                        player_id: player,
                        question_index,
                        answer_index,
                        is_correct,
                        timestamp_micros,
                    },
                )
                .is_some();

            Ok(AnswerOutcome::Recorded {
                is_correct,
                correct_text,
                updated,
            })
        }
        .boxed()
    }

    fn list_answers(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEventEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_answers").await? else {
                return Ok(Vec::new());
            };
            Ok(data
                .answers
                .get(&question_index)
                .map(|rows| rows.values().cloned().collect())
                .unwrap_or_default())
        }
        .boxed()
    }

    fn list_answers_for_player(
        &self,
        session: Uuid,
        player: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEventEntity>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_answers_for_player").await? else {
                return Ok(Vec::new());
            };
            let mut rows: Vec<AnswerEventEntity> = data
                .answers
                .values()
                .filter_map(|rows| rows.get(&player).cloned())
                .collect();
            rows.sort_by_key(|row| row.question_index);
            Ok(rows)
        }
        .boxed()
    }

    fn mark_spoken(
        &self,
        session: Uuid,
        player: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<SpokenOutcome>> {
        let inner = self.inner.clone();
        async move {
            let Some(mut data) = inner.lock_session(session, "mark_spoken").await? else {
                return Ok(SpokenOutcome::UnknownPlayer);
            };

            if !data.players.contains_key(&player) {
                return Ok(SpokenOutcome::UnknownPlayer);
            }

            let phase = data.state.phase;
            if !phase.is_question_active() {
                return Ok(SpokenOutcome::InvalidPhase { phase });
            }

            let newly = data.spoken.entry(question_index).or_default().insert(player);
            Ok(SpokenOutcome::Marked { newly })
        }
        .boxed()
    }

    fn list_spoken(
        &self,
        session: Uuid,
        question_index: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let inner = self.inner.clone();
        async move {
            let Some(data) = inner.lock_session(session, "list_spoken").await? else {
                return Ok(Vec::new());
            };
            Ok(data
                .spoken
                .get(&question_index)
                .map(|marks| marks.iter().copied().collect())
                .unwrap_or_default())
        }
        .boxed()
    }

    fn save_snapshot(
        &self,
        snapshot: SessionSnapshotEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        async move {
            let mut snapshots = inner.lock_snapshots("save_snapshot").await?;
            snapshots.insert(snapshot.name.clone(), snapshot);
            Ok(())
        }
        .boxed()
    }

    fn load_snapshot(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionSnapshotEntity>>> {
        let inner = self.inner.clone();
        async move {
            let snapshots = inner.lock_snapshots("load_snapshot").await?;
            Ok(snapshots.get(&name).cloned())
        }
        .boxed()
    }

    fn list_snapshots(&self) -> BoxFuture<'static, StorageResult<Vec<SnapshotListItemEntity>>> {
        let inner = self.inner.clone();
        async move {
            let snapshots = inner.lock_snapshots("list_snapshots").await?;
            let mut items: Vec<SnapshotListItemEntity> =
                snapshots.values().map(SnapshotListItemEntity::from).collect();
            items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
            Ok(items)
        }
        .boxed()
    }

    fn delete_snapshot(&self, name: String) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        async move {
            let mut snapshots = inner.lock_snapshots("delete_snapshot").await?;
            Ok(snapshots.shift_remove(&name).is_some())
        }
        .boxed()
    }

    fn restore_session(
        &self,
        session: Uuid,
        state: GameStateEntity,
        questions: Vec<QuestionEntity>,
        players: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        async move {
            inner.materialize_session(session);
            let Some(mut data) = inner.lock_session(session, "restore_session").await? else {
                // Materialized just above; only a concurrent delete can race
                // us here, in which case the restore target is gone anyway.
                return Ok(());
            };

            data.clear_events(ClearScope::AllEvents);
            data.state = state;
            data.questions = questions;
            data.players = players
                .into_iter()
                .map(|player| (player.id, player))
                .collect();
            Ok(())
        }
        .boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        async move { Ok(()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(index: usize, correct_index: usize) -> QuestionEntity {
        let options = vec!["red".to_string(), "green".to_string(), "blue".to_string()];
        QuestionEntity {
            index,
            text: format!("question {index}"),
            correct_text: options[correct_index].clone(),
            options,
            correct_index,
            image_ref: None,
            explanation: None,
        }
    }

    async fn seeded_session(store: &MemoryQuizStore, phase: GamePhase) -> (Uuid, Vec<Uuid>) {
        let meta = store
            .create_session("test".into(), None)
            .await
            .unwrap();
        store
            .replace_questions(meta.id, vec![question(0, 0), question(1, 2)])
            .await
            .unwrap();

        let mut players = Vec::new();
        for nickname in ["Ana", "Bo", "Cy"] {
            match store
                .join_player(meta.id, nickname.into())
                .await
                .unwrap()
                .unwrap()
            {
                JoinOutcome::Joined(player) => players.push(player.id),
                JoinOutcome::Rejoined(_) => panic!("fresh session should not rejoin"),
            }
        }

        let mut state = store.load_game_state(meta.id).await.unwrap().unwrap();
        state.game_started = true;
        state.phase = phase;
        store
            .commit_game_state(meta.id, None, state, ClearScope::None)
            .await
            .unwrap();

        (meta.id, players)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_buzzes_accept_each_player_once() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let mut handles = Vec::new();
        for player in &players {
            // Two racing attempts per player.
            for _ in 0..2 {
                let store = store.clone();
                let player = *player;
                handles.push(tokio::spawn(async move {
                    store.record_buzzer(session, player, 0).await.unwrap()
                }));
            }
        }

        let mut accepted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                BuzzOutcome::Accepted { .. } => accepted += 1,
                BuzzOutcome::AlreadyBuzzed => duplicates += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(accepted, players.len());
        assert_eq!(duplicates, players.len());

        let rows = store.list_buzzers(session, 0).await.unwrap();
        assert_eq!(rows.len(), players.len());
        for pair in rows.windows(2) {
            assert!(
                (pair[0].timestamp_micros, pair[0].seq) < (pair[1].timestamp_micros, pair[1].seq)
            );
        }
    }

    #[tokio::test]
    async fn first_buzz_locks_the_state() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let outcome = store.record_buzzer(session, players[1], 0).await.unwrap();
        assert!(matches!(outcome, BuzzOutcome::Accepted { first: true, .. }));
        let outcome = store.record_buzzer(session, players[0], 0).await.unwrap();
        assert!(matches!(outcome, BuzzOutcome::Accepted { first: false, .. }));

        let state = store.load_game_state(session).await.unwrap().unwrap();
        assert_eq!(state.first_buzzer_player_id, Some(players[1]));
        assert!(state.buzz_locked);
    }

    #[tokio::test]
    async fn buzz_rejected_outside_question_shown() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::OptionsShown).await;

        let outcome = store.record_buzzer(session, players[0], 0).await.unwrap();
        assert_eq!(
            outcome,
            BuzzOutcome::InvalidPhase {
                phase: GamePhase::OptionsShown
            }
        );
    }

    #[tokio::test]
    async fn buzz_rejected_for_stale_question_index() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let outcome = store.record_buzzer(session, players[0], 1).await.unwrap();
        assert!(matches!(outcome, BuzzOutcome::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn answer_upsert_keeps_last_write() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::OptionsShown).await;

        let first = store
            .record_answer(session, players[0], 0, 1)
            .await
            .unwrap();
        assert_eq!(
            first,
            AnswerOutcome::Recorded {
                is_correct: false,
                correct_text: "red".into(),
                updated: false,
            }
        );

        let second = store
            .record_answer(session, players[0], 0, 0)
            .await
            .unwrap();
        assert_eq!(
            second,
            AnswerOutcome::Recorded {
                is_correct: true,
                correct_text: "red".into(),
                updated: true,
            }
        );

        let rows = store.list_answers(session, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].answer_index, 0);
        assert!(rows[0].is_correct);
    }

    #[tokio::test]
    async fn answer_rejected_outside_options_shown() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let outcome = store
            .record_answer(session, players[0], 0, 0)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::InvalidPhase {
                phase: GamePhase::QuestionShown
            }
        );
    }

    #[tokio::test]
    async fn answer_out_of_range_is_rejected() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::OptionsShown).await;

        let outcome = store
            .record_answer(session, players[0], 0, 7)
            .await
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::AnswerOutOfRange { options: 3 });
    }

    #[tokio::test]
    async fn unknown_player_is_rejected() {
        let store = MemoryQuizStore::default();
        let (session, _players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let stranger = Uuid::new_v4();
        assert_eq!(
            store.record_buzzer(session, stranger, 0).await.unwrap(),
            BuzzOutcome::UnknownPlayer
        );
        assert_eq!(
            store.mark_spoken(session, stranger, 0).await.unwrap(),
            SpokenOutcome::UnknownPlayer
        );
    }

    #[tokio::test]
    async fn version_check_rejects_stale_commits() {
        let store = MemoryQuizStore::default();
        let (session, _players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let state = store.load_game_state(session).await.unwrap().unwrap();
        let version = state.version;

        let outcome = store
            .commit_game_state(session, Some(version), state.clone(), ClearScope::None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                version: version + 1
            }
        );

        // Replaying the same expected version must conflict and not mutate.
        let outcome = store
            .commit_game_state(session, Some(version), state, ClearScope::None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Conflict {
                actual: version + 1
            }
        );
        let current = store.load_game_state(session).await.unwrap().unwrap();
        assert_eq!(current.version, version + 1);
    }

    #[tokio::test]
    async fn commit_clears_requested_scope_only() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;
        store.record_buzzer(session, players[0], 0).await.unwrap();
        store.mark_spoken(session, players[0], 0).await.unwrap();

        let mut state = store.load_game_state(session).await.unwrap().unwrap();
        state.current_question_index = 1;
        store
            .commit_game_state(session, None, state, ClearScope::Question(1))
            .await
            .unwrap();

        assert_eq!(store.list_buzzers(session, 0).await.unwrap().len(), 1);
        assert_eq!(store.list_spoken(session, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn soft_reset_keeps_players_and_questions() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;
        store.record_buzzer(session, players[0], 0).await.unwrap();
        let before = store.load_game_state(session).await.unwrap().unwrap();

        store.reset_session(session, false).await.unwrap();

        let state = store.load_game_state(session).await.unwrap().unwrap();
        assert_eq!(state.phase, GamePhase::Waiting);
        assert!(!state.game_started);
        assert_eq!(state.version, before.version + 1);
        assert_eq!(store.list_players(session).await.unwrap().len(), 3);
        assert_eq!(store.list_questions(session).await.unwrap().len(), 2);
        assert!(store.list_buzzers(session, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_reset_also_clears_players_and_version() {
        let store = MemoryQuizStore::default();
        let (session, players) = seeded_session(&store, GamePhase::QuestionShown).await;
        store.record_buzzer(session, players[0], 0).await.unwrap();

        store.reset_session(session, true).await.unwrap();

        let state = store.load_game_state(session).await.unwrap().unwrap();
        assert_eq!(state.phase, GamePhase::Waiting);
        assert_eq!(state.version, 1);
        assert!(store.list_players(session).await.unwrap().is_empty());
        assert_eq!(store.list_questions(session).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn join_is_idempotent_per_nickname() {
        let store = MemoryQuizStore::default();
        let meta = store.create_session("s".into(), None).await.unwrap();

        let first = match store
            .join_player(meta.id, "Ana".into())
            .await
            .unwrap()
            .unwrap()
        {
            JoinOutcome::Joined(player) => player,
            JoinOutcome::Rejoined(_) => panic!("first join must create"),
        };

        match store
            .join_player(meta.id, "Ana".into())
            .await
            .unwrap()
            .unwrap()
        {
            JoinOutcome::Rejoined(player) => assert_eq!(player.id, first.id),
            JoinOutcome::Joined(_) => panic!("second join must reuse the row"),
        }

        assert_eq!(store.list_players(meta.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = MemoryQuizStore::default();
        let (session_a, players_a) = seeded_session(&store, GamePhase::QuestionShown).await;
        let (session_b, _players_b) = seeded_session(&store, GamePhase::QuestionShown).await;

        store
            .record_buzzer(session_a, players_a[0], 0)
            .await
            .unwrap();

        assert!(store.list_buzzers(session_b, 0).await.unwrap().is_empty());
        // A player from one session is a stranger in the other.
        assert_eq!(
            store
                .record_buzzer(session_b, players_a[0], 0)
                .await
                .unwrap(),
            BuzzOutcome::UnknownPlayer
        );
    }

    #[tokio::test]
    async fn snapshots_round_trip() {
        let store = MemoryQuizStore::default();
        let (session, _players) = seeded_session(&store, GamePhase::QuestionShown).await;

        let snapshot = SessionSnapshotEntity {
            name: "backup".into(),
            saved_at: SystemTime::now(),
            session_id: session,
            session_name: "test".into(),
            notes: Some("pub night".into()),
            game_state: store.load_game_state(session).await.unwrap().unwrap(),
            questions: store.list_questions(session).await.unwrap(),
            players: store.list_players(session).await.unwrap(),
        };

        store.save_snapshot(snapshot.clone()).await.unwrap();
        let loaded = store.load_snapshot("backup".into()).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let items = store.list_snapshots().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question_count, 2);
        assert_eq!(items[0].player_count, 3);

        assert!(store.delete_snapshot("backup".into()).await.unwrap());
        assert!(!store.delete_snapshot("backup".into()).await.unwrap());
    }
}
