//! Engine-level error types.

use core::fmt;

use crate::action::{
    ActivationError, CommandError, InteractError, MoveError, SetupError,
};
use crate::combat::CombatError;

/// Which pipeline phase rejected the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionPhase::PreValidate => "pre-validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post-validate",
        };
        f.write_str(name)
    }
}

/// An action error annotated with the phase that raised it. Pre-validate
/// failures are guaranteed to have left the record untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{error} ({phase})")]
pub struct TransitionPhaseError<E: fmt::Display> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E: fmt::Display> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

/// Errors raised when inverting the undo log.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UndoError {
    #[error("nothing to undo")]
    Empty,

    #[error("undo state mismatch: {0}")]
    Mismatch(String),
}

/// Umbrella error for action execution, one variant per transition family.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    #[error("the game has ended")]
    GameEnded,

    #[error(transparent)]
    Setup(TransitionPhaseError<SetupError>),

    #[error(transparent)]
    Activation(TransitionPhaseError<ActivationError>),

    #[error(transparent)]
    Move(TransitionPhaseError<MoveError>),

    #[error(transparent)]
    Combat(TransitionPhaseError<CombatError>),

    #[error(transparent)]
    Interact(TransitionPhaseError<InteractError>),

    #[error(transparent)]
    Command(TransitionPhaseError<CommandError>),

    #[error(transparent)]
    Undo(#[from] UndoError),
}
