use serde::Serialize;
use utoipa::ToSchema;

use crate::state::machine::GamePhase;

/// Publicly visible game phase exposed to polling clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No game running; players can join.
    Waiting,
    /// Question text visible, buzzers armed.
    QuestionShown,
    /// Options visible, answers accepted.
    OptionsShown,
    /// Correct answer revealed.
    Reveal,
    /// Question list exhausted.
    Finished,
}

impl From<GamePhase> for VisiblePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Waiting => VisiblePhase::Waiting,
            GamePhase::QuestionShown => VisiblePhase::QuestionShown,
            GamePhase::OptionsShown => VisiblePhase::OptionsShown,
            GamePhase::Reveal => VisiblePhase::Reveal,
            GamePhase::Finished => VisiblePhase::Finished,
        }
    }
}
