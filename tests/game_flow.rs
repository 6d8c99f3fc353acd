//! End-to-end exercise of the service layer against the in-memory store:
//! joining, buzzing, answering, the moderator flow, statistics, resets, and
//! the save/load round trip.

use std::sync::Arc;

use uuid::Uuid;

use quizbox_back::{
    config::AppConfig,
    dao::quiz_store::{QuizStore, memory::MemoryQuizStore},
    dto::{
        admin::{AdvanceRequest, CreateSessionRequest, LoadSessionRequest, SaveSessionRequest,
                QuestionInput, UpdateQuestionsRequest},
        player::{AnswerRequest, BuzzRequest, JoinRequest, RejectReason},
    },
    error::ServiceError,
    services::{game_flow_service, player_service, question_service, session_service,
               snapshot_service},
    state::{AppState, SharedState},
};

async fn test_state() -> (SharedState, Arc<MemoryQuizStore>) {
    let state = AppState::new(AppConfig::default());
    let store = Arc::new(MemoryQuizStore::default());
    state.install_quiz_store(store.clone()).await;
    (state, store)
}

fn question(text: &str, options: &[&str], correct_index: usize) -> QuestionInput {
    QuestionInput {
        text: text.into(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_index,
        image_ref: None,
        explanation: Some(format!("because {}", options[correct_index])),
    }
}

async fn setup_session(state: &SharedState) -> Uuid {
    let summary = session_service::create_session(
        state,
        CreateSessionRequest {
            name: "pub quiz".into(),
            notes: None,
        },
    )
    .await
    .unwrap();

    question_service::replace_questions(
        state,
        summary.id,
        UpdateQuestionsRequest {
            questions: vec![
                question("Capital of France?", &["Paris", "Lyon", "Nice"], 0),
                question("Largest planet?", &["Mars", "Jupiter"], 1),
            ],
        },
    )
    .await
    .unwrap();

    summary.id
}

async fn join(state: &SharedState, session: Uuid, nickname: &str) -> Uuid {
    player_service::join(
        state,
        session,
        JoinRequest {
            nickname: nickname.into(),
        },
    )
    .await
    .unwrap()
    .player_id
}

/// Find the current position of an option text in the stored (shuffled)
/// question, so tests can submit deliberately right or wrong answers.
async fn option_index(
    store: &Arc<MemoryQuizStore>,
    session: Uuid,
    question_index: usize,
    text: &str,
) -> usize {
    let questions = store.list_questions(session).await.unwrap();
    questions[question_index]
        .options
        .iter()
        .position(|option| option == text)
        .unwrap()
}

#[tokio::test]
async fn three_player_round_trip() {
    let (state, store) = test_state().await;
    let session = setup_session(&state).await;

    let ana = join(&state, session, "Ana").await;
    let bo = join(&state, session, "Bo").await;
    let _cy = join(&state, session, "Cy").await;

    game_flow_service::start_game(&state, session).await.unwrap();

    // Ana buzzes first, Bo second.
    let first = player_service::buzz(
        &state,
        session,
        BuzzRequest {
            player_id: ana,
            question_index: 0,
        },
    )
    .await
    .unwrap();
    assert!(first.accepted);
    assert_eq!(first.first, Some(true));

    let second = player_service::buzz(
        &state,
        session,
        BuzzRequest {
            player_id: bo,
            question_index: 0,
        },
    )
    .await
    .unwrap();
    assert!(second.accepted);
    assert_eq!(second.first, Some(false));

    // Answering is not open yet.
    let early = player_service::submit_answer(
        &state,
        session,
        AnswerRequest {
            player_id: ana,
            question_index: 0,
            answer_index: 0,
        },
    )
    .await
    .unwrap();
    assert!(!early.accepted);
    assert_eq!(early.reason, Some(RejectReason::InvalidPhase));

    game_flow_service::show_options(&state, session).await.unwrap();

    // Buzzing is closed once options are shown.
    let late_buzz = player_service::buzz(
        &state,
        session,
        BuzzRequest {
            player_id: bo,
            question_index: 0,
        },
    )
    .await
    .unwrap();
    assert!(!late_buzz.accepted);
    assert_eq!(late_buzz.reason, Some(RejectReason::InvalidPhase));

    let paris = option_index(&store, session, 0, "Paris").await;
    let lyon = option_index(&store, session, 0, "Lyon").await;

    let ana_answer = player_service::submit_answer(
        &state,
        session,
        AnswerRequest {
            player_id: ana,
            question_index: 0,
            answer_index: paris,
        },
    )
    .await
    .unwrap();
    assert_eq!(ana_answer.is_correct, Some(true));
    assert_eq!(ana_answer.correct_answer_text.as_deref(), Some("Paris"));

    let bo_answer = player_service::submit_answer(
        &state,
        session,
        AnswerRequest {
            player_id: bo,
            question_index: 0,
            answer_index: lyon,
        },
    )
    .await
    .unwrap();
    assert_eq!(bo_answer.is_correct, Some(false));

    game_flow_service::reveal(&state, session).await.unwrap();

    let stats = snapshot_service::get_answer_stats(&state, session, 0)
        .await
        .unwrap();
    assert_eq!(stats.answered_count, 2);
    assert_eq!(stats.active_player_count, 3);
    assert!(!stats.all_answered);
    assert_eq!(stats.not_answered_names, vec!["Cy".to_string()]);

    let summary = snapshot_service::get_player_summary(&state, session, ana)
        .await
        .unwrap();
    assert_eq!(summary.total_questions, 2);
    assert_eq!(summary.correct_count, 1);
    assert_eq!(summary.incorrect_count, 0);
    assert_eq!(summary.unanswered, vec![1]);
    assert_eq!(summary.breakdown.len(), 2);
    assert_eq!(summary.breakdown[0].is_correct, Some(true));

    // The snapshot reflects the reveal: buzz order and the answer key.
    let snapshot = snapshot_service::get_snapshot(&state, session).await.unwrap();
    let buzz_names: Vec<&str> = snapshot
        .buzzers
        .iter()
        .map(|b| b.nickname.as_str())
        .collect();
    assert_eq!(buzz_names, vec!["Ana", "Bo"]);
    let revealed = snapshot.question.unwrap();
    assert_eq!(revealed.correct_index, Some(paris));
}

#[tokio::test]
async fn changing_an_answer_keeps_only_the_last_one() {
    let (state, store) = test_state().await;
    let session = setup_session(&state).await;
    let ana = join(&state, session, "Ana").await;

    game_flow_service::start_game(&state, session).await.unwrap();
    game_flow_service::show_options(&state, session).await.unwrap();

    let paris = option_index(&store, session, 0, "Paris").await;
    let nice = option_index(&store, session, 0, "Nice").await;

    for answer_index in [paris, nice] {
        player_service::submit_answer(
            &state,
            session,
            AnswerRequest {
                player_id: ana,
                question_index: 0,
                answer_index,
            },
        )
        .await
        .unwrap();
    }

    let rows = store.list_answers(session, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].answer_index, nice);
    assert!(!rows[0].is_correct);
}

#[tokio::test]
async fn stale_version_cannot_advance_twice() {
    let (state, _store) = test_state().await;
    let session = setup_session(&state).await;
    join(&state, session, "Ana").await;

    game_flow_service::start_game(&state, session).await.unwrap();
    game_flow_service::show_options(&state, session).await.unwrap();
    let revealed = game_flow_service::reveal(&state, session).await.unwrap();

    let advanced = game_flow_service::advance(
        &state,
        session,
        AdvanceRequest {
            expected_version: revealed.version,
        },
    )
    .await
    .unwrap();
    assert_eq!(advanced.current_question_index, 1);

    // A duplicate request with the same token must not advance again.
    let err = game_flow_service::advance(
        &state,
        session,
        AdvanceRequest {
            expected_version: revealed.version,
        },
    )
    .await
    .unwrap_err();
    match err {
        ServiceError::VersionConflict { current } => assert_eq!(current, advanced.version),
        other => panic!("expected version conflict, got {other:?}"),
    }

    let snapshot = snapshot_service::get_snapshot(&state, session).await.unwrap();
    assert_eq!(snapshot.state.current_question_index, 1);
}

#[tokio::test]
async fn version_counts_each_committed_transition() {
    let (state, _store) = test_state().await;
    let session = setup_session(&state).await;

    let initial = snapshot_service::get_snapshot(&state, session)
        .await
        .unwrap()
        .state
        .version;

    game_flow_service::start_game(&state, session).await.unwrap();
    game_flow_service::show_options(&state, session).await.unwrap();
    let after = game_flow_service::reveal(&state, session).await.unwrap();

    assert_eq!(after.version, initial + 3);
}

#[tokio::test]
async fn finishing_the_last_question_ends_the_game() {
    let (state, _store) = test_state().await;
    let session = setup_session(&state).await;

    game_flow_service::start_game(&state, session).await.unwrap();
    game_flow_service::show_options(&state, session).await.unwrap();
    let revealed = game_flow_service::reveal(&state, session).await.unwrap();
    let advanced = game_flow_service::advance(
        &state,
        session,
        AdvanceRequest {
            expected_version: revealed.version,
        },
    )
    .await
    .unwrap();

    game_flow_service::show_options(&state, session).await.unwrap();
    let revealed = game_flow_service::reveal(&state, session).await.unwrap();
    assert_eq!(advanced.current_question_index, 1);

    let finished = game_flow_service::advance(
        &state,
        session,
        AdvanceRequest {
            expected_version: revealed.version,
        },
    )
    .await
    .unwrap();

    let snapshot = snapshot_service::get_snapshot(&state, session).await.unwrap();
    assert_eq!(snapshot.state.version, finished.version);
    assert!(!snapshot.state.game_started);
    assert!(snapshot.question.is_none());
}

#[tokio::test]
async fn soft_reset_keeps_roster_full_reset_drops_it() {
    let (state, store) = test_state().await;
    let session = setup_session(&state).await;
    let ana = join(&state, session, "Ana").await;

    game_flow_service::start_game(&state, session).await.unwrap();
    player_service::buzz(
        &state,
        session,
        BuzzRequest {
            player_id: ana,
            question_index: 0,
        },
    )
    .await
    .unwrap();

    game_flow_service::soft_reset(&state, session).await.unwrap();
    assert_eq!(store.list_players(session).await.unwrap().len(), 1);
    assert_eq!(store.list_questions(session).await.unwrap().len(), 2);
    assert!(store.list_buzzers(session, 0).await.unwrap().is_empty());

    game_flow_service::full_reset(&state, session).await.unwrap();
    assert!(store.list_players(session).await.unwrap().is_empty());
    assert_eq!(store.list_questions(session).await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejoining_returns_the_same_player() {
    let (state, _store) = test_state().await;
    let session = setup_session(&state).await;

    let first = player_service::join(
        &state,
        session,
        JoinRequest {
            nickname: "Ana".into(),
        },
    )
    .await
    .unwrap();
    assert!(!first.existing);

    let again = player_service::join(
        &state,
        session,
        JoinRequest {
            nickname: "Ana".into(),
        },
    )
    .await
    .unwrap();
    assert!(again.existing);
    assert_eq!(again.player_id, first.player_id);
}

#[tokio::test]
async fn save_then_load_reproduces_questions_and_nicknames() {
    let (state, store) = test_state().await;
    let session = setup_session(&state).await;
    for nickname in ["Ana", "Bo", "Cy"] {
        join(&state, session, nickname).await;
    }

    session_service::save_session(
        &state,
        session,
        SaveSessionRequest {
            name: "friday".into(),
            notes: Some("week 12".into()),
        },
    )
    .await
    .unwrap();

    let restored_session = Uuid::new_v4();
    session_service::load_session(
        &state,
        restored_session,
        LoadSessionRequest {
            name: "friday".into(),
        },
    )
    .await
    .unwrap();

    let original_questions = store.list_questions(session).await.unwrap();
    let restored_questions = store.list_questions(restored_session).await.unwrap();
    assert_eq!(original_questions, restored_questions);

    let original_players = store.list_players(session).await.unwrap();
    let restored_players = store.list_players(restored_session).await.unwrap();
    let original_names: Vec<&str> = original_players
        .iter()
        .map(|p| p.nickname.as_str())
        .collect();
    let restored_names: Vec<&str> = restored_players
        .iter()
        .map(|p| p.nickname.as_str())
        .collect();
    assert_eq!(original_names, restored_names);
    // Restored players are new rows.
    assert!(
        original_players
            .iter()
            .zip(&restored_players)
            .all(|(a, b)| a.id != b.id)
    );
}

#[tokio::test]
async fn polling_an_unseen_session_creates_it() {
    let (state, store) = test_state().await;
    let session = Uuid::new_v4();

    let snapshot = snapshot_service::get_snapshot(&state, session).await.unwrap();
    assert_eq!(snapshot.session_id, session);
    assert!(store.session_exists(session).await.unwrap());
}

#[tokio::test]
async fn degraded_mode_rejects_operations() {
    let (state, _store) = test_state().await;
    state.clear_quiz_store().await;

    let err = session_service::list_sessions(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
    assert!(state.is_degraded().await);
}

#[tokio::test]
async fn questions_cannot_change_mid_game() {
    let (state, _store) = test_state().await;
    let session = setup_session(&state).await;

    game_flow_service::start_game(&state, session).await.unwrap();

    let err = question_service::replace_questions(
        &state,
        session,
        UpdateQuestionsRequest {
            questions: vec![question("new?", &["a", "b"], 0)],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidPhase { .. }));
}
