//! Read-only projections: the polled game snapshot, per-player summaries,
//! and the moderator's answer statistics. Pure composition over the store,
//! no side effects beyond implicit session creation for pollers.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{AnswerEventEntity, QuestionEntity},
    dto::{
        admin::AnswerStatsResponse,
        game::{AnswerView, BuzzerView, GameSnapshot, GameStateView, PlayerView, QuestionView},
        player::{PlayerSummaryResponse, SummaryLine},
    },
    error::ServiceError,
    services::session_service,
    state::SharedState,
};

/// Assemble the full polled state for one session.
///
/// Polling an unseen session id creates it, so fresh rooms need no explicit
/// provisioning step before the first client shows up.
pub async fn get_snapshot(
    state: &SharedState,
    session: Uuid,
) -> Result<GameSnapshot, ServiceError> {
    session_service::ensure_session(state, session).await?;
    let store = state.require_quiz_store().await?;

    let game_state = store
        .load_game_state(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;

    let players = store.list_players(session).await?;
    let questions = store.list_questions(session).await?;
    let index = game_state.current_question_index;

    let buzzer_rows = store.list_buzzers(session, index).await?;
    let answer_rows = store.list_answers(session, index).await?;
    let spoken_players = store.list_spoken(session, index).await?;

    let nicknames: HashMap<Uuid, &str> = players
        .iter()
        .map(|player| (player.id, player.nickname.as_str()))
        .collect();
    let nickname_of = |id: Uuid| -> String {
        nicknames
            .get(&id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| "(gone)".to_string())
    };

    let question = game_state
        .phase
        .is_question_active()
        .then(|| {
            questions
                .get(index)
                .map(|q| QuestionView::for_phase(q, game_state.phase))
        })
        .flatten();

    Ok(GameSnapshot {
        session_id: session,
        state: GameStateView::from(&game_state),
        question,
        question_count: questions.len(),
        buzzers: buzzer_rows
            .iter()
            .map(|event| BuzzerView::new(event, nickname_of(event.player_id)))
            .collect(),
        answers: answer_rows
            .iter()
            .map(|event| AnswerView {
                player_id: event.player_id,
                nickname: nickname_of(event.player_id),
                answer_index: event.answer_index,
                is_correct: event.is_correct,
            })
            .collect(),
        spoken_players,
        players: players.iter().map(PlayerView::from).collect(),
    })
}

/// Compute a player's results by joining their answers against the full
/// question bank. Unanswered questions are listed explicitly.
pub async fn get_player_summary(
    state: &SharedState,
    session: Uuid,
    player_id: Uuid,
) -> Result<PlayerSummaryResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let player = store
        .find_player(session, player_id)
        .await?
        .ok_or(ServiceError::UnknownPlayer)?;

    let questions = store.list_questions(session).await?;
    let answers = store.list_answers_for_player(session, player_id).await?;
    let by_question: HashMap<usize, &AnswerEventEntity> = answers
        .iter()
        .map(|answer| (answer.question_index, answer))
        .collect();

    let mut breakdown = Vec::with_capacity(questions.len());
    let mut unanswered = Vec::new();
    let mut correct_count = 0;
    let mut incorrect_count = 0;

    for question in &questions {
        let answer = by_question.get(&question.index).copied();
        let is_correct = answer.map(|row| verified_correctness(question, row));

        match is_correct {
            Some(true) => correct_count += 1,
            Some(false) => incorrect_count += 1,
            None => unanswered.push(question.index),
        }

        breakdown.push(SummaryLine {
            question_index: question.index,
            question: question.text.clone(),
            player_answer_text: answer
                .and_then(|row| question.options.get(row.answer_index).cloned()),
            correct_answer_text: question.correct_text.clone(),
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    Ok(PlayerSummaryResponse {
        player_id,
        nickname: player.nickname,
        total_questions: questions.len(),
        answered_count: correct_count + incorrect_count,
        correct_count,
        incorrect_count,
        unanswered,
        breakdown,
    })
}

/// Moderator aggregate: who has answered the given question so far.
pub async fn get_answer_stats(
    state: &SharedState,
    session: Uuid,
    question_index: usize,
) -> Result<AnswerStatsResponse, ServiceError> {
    let store = state.require_quiz_store().await?;

    let questions = store.list_questions(session).await?;
    if question_index >= questions.len() {
        return Err(ServiceError::QuestionNotFound {
            index: question_index,
        });
    }

    let players = store.list_players(session).await?;
    let answers = store.list_answers(session, question_index).await?;
    let answered_ids: HashSet<Uuid> = answers.iter().map(|answer| answer.player_id).collect();

    let mut answered_names = Vec::new();
    let mut not_answered_names = Vec::new();
    for player in players.iter().filter(|player| player.active) {
        if answered_ids.contains(&player.id) {
            answered_names.push(player.nickname.clone());
        } else {
            not_answered_names.push(player.nickname.clone());
        }
    }

    let active_player_count = answered_names.len() + not_answered_names.len();
    Ok(AnswerStatsResponse {
        question_index,
        answered_count: answered_names.len(),
        active_player_count,
        all_answered: active_player_count > 0 && not_answered_names.is_empty(),
        answered_names,
        not_answered_names,
    })
}

/// Trust the stored correctness flag unless it disagrees with the question
/// it points at; derived fields are audit data, not ground truth.
fn verified_correctness(question: &QuestionEntity, answer: &AnswerEventEntity) -> bool {
    let recomputed = question
        .effective_correct_index()
        .map(|correct| answer.answer_index == correct);

    match recomputed {
        Some(value) if value != answer.is_correct => {
            warn!(
                question = question.index,
                player = %answer.player_id,
                stored = answer.is_correct,
                "stored correctness disagrees with question data; using recomputed value"
            );
            value
        }
        Some(value) => value,
        None => {
            warn!(
                question = question.index,
                "question data is internally inconsistent; keeping stored correctness"
            );
            answer.is_correct
        }
    }
}
