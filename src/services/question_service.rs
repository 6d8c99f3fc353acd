//! Question-set replacement: validation, option shuffling, and the
//! correctness verification that keeps the stored answer key honest.

use rand::{Rng, rng, seq::SliceRandom};
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::QuestionSeed,
    dao::models::QuestionEntity,
    dto::admin::{QuestionInput, QuestionsUpdatedResponse, UpdateQuestionsRequest},
    error::ServiceError,
    state::SharedState,
    state::machine::GamePhase,
};

/// Replace a session's entire question set.
///
/// Fail-closed: every question is validated and shuffled before anything is
/// written, and the store swap itself is atomic, so a bad question in the
/// batch leaves the existing set untouched.
pub async fn replace_questions(
    state: &SharedState,
    session: Uuid,
    request: UpdateQuestionsRequest,
) -> Result<QuestionsUpdatedResponse, ServiceError> {
    request.validate()?;

    let store = state.require_quiz_store().await?;
    let game_state = store
        .load_game_state(session)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session}` not found")))?;

    // Swapping the bank mid-question would orphan the current index and the
    // ledger rows attached to it.
    if game_state.phase != GamePhase::Waiting && game_state.phase != GamePhase::Finished {
        return Err(ServiceError::InvalidPhase {
            phase: game_state.phase,
        });
    }

    let questions = build_entities(request.questions)?;
    let count = questions.len();
    if !store.replace_questions(session, questions).await? {
        return Err(ServiceError::NotFound(format!("session `{session}` not found")));
    }

    debug!(%session, count, "question set replaced");
    Ok(QuestionsUpdatedResponse { count })
}

/// Prepare entities from the configured default question set, used to seed
/// sessions created on first reference.
pub fn entities_from_seeds(seeds: &[QuestionSeed]) -> Result<Vec<QuestionEntity>, ServiceError> {
    let inputs = seeds
        .iter()
        .map(|seed| QuestionInput {
            text: seed.text.clone(),
            options: seed.options.clone(),
            correct_index: seed.correct_index,
            image_ref: seed.image_ref.clone(),
            explanation: seed.explanation.clone(),
        })
        .collect();
    build_entities(inputs)
}

fn build_entities(inputs: Vec<QuestionInput>) -> Result<Vec<QuestionEntity>, ServiceError> {
    let mut rng = rng();
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| prepare_question(index, input, &mut rng))
        .collect()
}

/// Validate one question, shuffle its options, and remap the correct index.
///
/// The remap is verified by exact text comparison; a mismatch falls back to
/// the first exact text match, and if the text is gone entirely the whole
/// replacement aborts rather than persisting a wrong answer key.
fn prepare_question(
    index: usize,
    input: QuestionInput,
    rng: &mut impl Rng,
) -> Result<QuestionEntity, ServiceError> {
    if input.text.trim().is_empty() {
        return Err(ServiceError::Validation(format!(
            "question {index}: text must not be blank"
        )));
    }
    if input.options.len() < 2 {
        return Err(ServiceError::Validation(format!(
            "question {index}: at least two options are required"
        )));
    }
    if input.options.iter().any(|option| option.trim().is_empty()) {
        return Err(ServiceError::Validation(format!(
            "question {index}: options must not be blank"
        )));
    }
    if input.correct_index >= input.options.len() {
        return Err(ServiceError::Validation(format!(
            "question {index}: correct_index {} is out of range for {} options",
            input.correct_index,
            input.options.len()
        )));
    }

    let correct_text = input.options[input.correct_index].clone();

    let mut indexed: Vec<(usize, String)> = input.options.into_iter().enumerate().collect();
    indexed.shuffle(rng);

    let mut correct_index = indexed
        .iter()
        .position(|(original, _)| *original == input.correct_index)
        .ok_or_else(|| {
            ServiceError::CriticalIntegrity(format!(
                "question {index}: correct option lost during shuffle"
            ))
        })?;
    let options: Vec<String> = indexed.into_iter().map(|(_, text)| text).collect();

    if options[correct_index] != correct_text {
        warn!(
            question = index,
            "shuffle verification mismatch; falling back to text match"
        );
        correct_index = options
            .iter()
            .position(|option| *option == correct_text)
            .ok_or_else(|| {
                ServiceError::CriticalIntegrity(format!(
                    "question {index}: shuffled options no longer contain the correct answer text"
                ))
            })?;
    }

    Ok(QuestionEntity {
        index,
        text: input.text,
        options,
        correct_index,
        correct_text,
        image_ref: input.image_ref,
        explanation: input.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(options: &[&str], correct_index: usize) -> QuestionInput {
        QuestionInput {
            text: "what?".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            image_ref: None,
            explanation: None,
        }
    }

    #[test]
    fn shuffle_preserves_correct_answer_text() {
        // Enough options to make a mis-remap virtually certain to surface.
        let options: Vec<String> = (0..10).map(|i| format!("option {i}")).collect();
        let option_refs: Vec<&str> = options.iter().map(String::as_str).collect();

        for round in 0..50 {
            let correct = round % options.len();
            let entity = build_entities(vec![input(&option_refs, correct)])
                .unwrap()
                .remove(0);
            assert_eq!(entity.options[entity.correct_index], options[correct]);
            assert_eq!(entity.correct_text, options[correct]);
            assert_eq!(entity.options.len(), options.len());
        }
    }

    #[test]
    fn duplicate_option_texts_stay_consistent() {
        // Two options share the winning text; any position carrying it is a
        // valid answer key.
        for _ in 0..20 {
            let entity = build_entities(vec![input(&["same", "same", "other"], 0)])
                .unwrap()
                .remove(0);
            assert_eq!(entity.options[entity.correct_index], "same");
        }
    }

    #[test]
    fn entities_are_indexed_contiguously() {
        let entities = build_entities(vec![
            input(&["a", "b"], 0),
            input(&["c", "d"], 1),
            input(&["e", "f"], 0),
        ])
        .unwrap();
        let indexes: Vec<usize> = entities.iter().map(|q| q.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let err = build_entities(vec![input(&["a", "b"], 2)]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn rejects_single_option_questions() {
        let err = build_entities(vec![input(&["only"], 0)]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn rejects_blank_options() {
        let err = build_entities(vec![input(&["a", "  "], 0)]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn one_bad_question_rejects_the_whole_batch() {
        let err = build_entities(vec![input(&["a", "b"], 0), input(&["c"], 0)]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
