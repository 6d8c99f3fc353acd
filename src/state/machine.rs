use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phases a quiz session moves through while the moderator drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No game is running; players can join and questions can be managed.
    Waiting,
    /// The current question text is visible, buzzers are armed.
    QuestionShown,
    /// Answer options are visible, players may submit and change answers.
    OptionsShown,
    /// The correct answer is revealed for the current question.
    Reveal,
    /// The question list is exhausted; final summaries are available.
    Finished,
}

/// Events the moderator can apply to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Start the game at question zero.
    Start,
    /// Show the answer options for the current question.
    ShowOptions,
    /// Reveal the correct answer for the current question.
    Reveal,
    /// Move on to the next question after a reveal.
    Advance,
    /// No questions remain after a reveal; end the game.
    Finish,
    /// Return to waiting, keeping players and questions.
    SoftReset,
    /// Return to waiting, additionally dropping players.
    FullReset,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event arrived.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Compute the phase reached by applying `event` in `from`, if the
/// transition is legal.
///
/// This table is pure; committing the resulting phase (and the version bump
/// that goes with it) is the storage layer's job, so concurrent moderators
/// are arbitrated by the store's version check rather than by this module.
pub fn next_phase(from: GamePhase, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (GamePhase::Waiting, GameEvent::Start) => GamePhase::QuestionShown,
        (GamePhase::QuestionShown, GameEvent::ShowOptions) => GamePhase::OptionsShown,
        (GamePhase::OptionsShown, GameEvent::Reveal) => GamePhase::Reveal,
        (GamePhase::Reveal, GameEvent::Advance) => GamePhase::QuestionShown,
        (GamePhase::Reveal, GameEvent::Finish) => GamePhase::Finished,
        (_, GameEvent::SoftReset) => GamePhase::Waiting,
        (_, GameEvent::FullReset) => GamePhase::Waiting,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

impl GamePhase {
    /// True while a started game is in one of the per-question phases.
    pub fn is_question_active(self) -> bool {
        matches!(
            self,
            GamePhase::QuestionShown | GamePhase::OptionsShown | GamePhase::Reveal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path_through_game() {
        let mut phase = GamePhase::Waiting;
        for event in [
            GameEvent::Start,
            GameEvent::ShowOptions,
            GameEvent::Reveal,
            GameEvent::Advance,
            GameEvent::ShowOptions,
            GameEvent::Reveal,
            GameEvent::Finish,
        ] {
            phase = next_phase(phase, event).unwrap();
        }
        assert_eq!(phase, GamePhase::Finished);
    }

    #[test]
    fn advance_reenters_question_shown() {
        assert_eq!(
            next_phase(GamePhase::Reveal, GameEvent::Advance).unwrap(),
            GamePhase::QuestionShown
        );
    }

    #[test]
    fn resets_are_legal_from_every_phase() {
        for phase in [
            GamePhase::Waiting,
            GamePhase::QuestionShown,
            GamePhase::OptionsShown,
            GamePhase::Reveal,
            GamePhase::Finished,
        ] {
            assert_eq!(
                next_phase(phase, GameEvent::SoftReset).unwrap(),
                GamePhase::Waiting
            );
            assert_eq!(
                next_phase(phase, GameEvent::FullReset).unwrap(),
                GamePhase::Waiting
            );
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let err = next_phase(GamePhase::Waiting, GameEvent::Reveal).unwrap_err();
        assert_eq!(err.from, GamePhase::Waiting);
        assert_eq!(err.event, GameEvent::Reveal);

        // Skipping the options phase is not allowed.
        assert!(next_phase(GamePhase::QuestionShown, GameEvent::Reveal).is_err());
        // A finished game can only be reset.
        assert!(next_phase(GamePhase::Finished, GameEvent::Start).is_err());
        assert!(next_phase(GamePhase::Finished, GameEvent::Advance).is_err());
        // Starting twice is rejected.
        assert!(next_phase(GamePhase::QuestionShown, GameEvent::Start).is_err());
    }

    #[test]
    fn question_active_phases() {
        assert!(!GamePhase::Waiting.is_question_active());
        assert!(GamePhase::QuestionShown.is_question_active());
        assert!(GamePhase::OptionsShown.is_question_active());
        assert!(GamePhase::Reveal.is_question_active());
        assert!(!GamePhase::Finished.is_question_active());
    }
}
