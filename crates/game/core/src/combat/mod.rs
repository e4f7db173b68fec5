//! Combat resolution engine.
//!
//! An attack runs as a per-session state machine (declare → pre-combat
//! window → roll → reroll → surge → resolve → cleave) with every transition
//! guarded by the session phase. Dice are deterministic through the RNG
//! oracle; resolution math lives in pure helpers so the laws (evade
//! cancellation, dodge negation, non-negative damage) are testable without
//! a live game.

pub mod dice;

mod resolve;
mod session;

pub use dice::{
    AttackDie, AttackFace, AttackTotals, DefenseDie, DefenseFace, DefenseTotals, RollSide,
};
pub use resolve::{DamageBreakdown, DefeatOutcome, ResolveSummary, apply_damage_to, breakdown,
    resolve_cleave, resolve_pending};
pub use session::{AttackSession, CombatPhase, SurgeSpent};

use crate::state::FigureKey;

/// Surge results cancelled by evade: `min(raw_surge, total_evade)`.
pub fn evade_cancelled_surge(raw_surge: u32, total_evade: u32) -> u32 {
    raw_surge.min(total_evade)
}

/// Errors raised by the combat pipeline. Validation failures reject the
/// request without mutating the session.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatError {
    #[error("no attack is in progress")]
    NoPendingCombat,

    #[error("action not allowed during {phase}")]
    NotInActivationPhase {
        phase: crate::round::GamePhase,
    },

    #[error("it is not your activation turn")]
    NotYourTurn,

    #[error("figure {0} is not part of the current activation")]
    NotInActivation(FigureKey),

    #[error("figure {0} has no actions left")]
    NoActionsLeft(FigureKey),

    #[error("an attack is already in progress")]
    CombatInProgress,

    #[error("{0} is not a hostile figure on the board")]
    InvalidTarget(FigureKey),

    #[error("that combat step belongs to the other player")]
    NotYourStep,

    #[error("combat step out of order: expected {expected}, attack is at {actual}")]
    WrongPhase {
        expected: CombatPhase,
        actual: CombatPhase,
    },

    #[error("figure {0} not found")]
    UnknownFigure(FigureKey),

    #[error("target at distance {distance} outside range {min}..={max}")]
    OutOfRange { distance: u32, min: u32, max: u32 },

    #[error("no line of sight to target")]
    NoLineOfSight,

    #[error("both sides must be ready before dice are rolled")]
    PreCombatNotReady,

    #[error("no rerolls left")]
    NoRerollsLeft,

    #[error("die index {index} out of range")]
    InvalidDieIndex { index: usize },

    #[error("surge ability {index} does not exist")]
    InvalidSurgeIndex { index: usize },

    #[error("surge ability {index} already spent this attack")]
    SurgeAlreadySpent { index: usize },

    #[error("surge ability costs {cost}, only {available} available")]
    NotEnoughSurge { cost: u8, available: u32 },

    #[error("figure {0} is not a legal cleave target")]
    InvalidCleaveTarget(FigureKey),

    #[error("missing oracle: {0}")]
    Oracle(#[from] crate::env::OracleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evade_cancellation_is_clamped() {
        assert_eq!(evade_cancelled_surge(3, 1), 1);
        assert_eq!(evade_cancelled_surge(1, 3), 1);
        assert_eq!(evade_cancelled_surge(0, 2), 0);
    }
}
