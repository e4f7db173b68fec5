//! Reversible-action log.
//!
//! Every undoable mutation pushes one tagged entry carrying exactly the
//! prior-state fields needed to invert it, at the same transaction boundary
//! as the forward mutation. The engine pops and inverts on `Undo`.

use crate::movement::MoveSession;

use super::common::Position;
use super::figure::FigureKey;
use super::player::Side;

/// What an `Interact` changed, for inversion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractUndo {
    DoorOpened(u16),
    TokenPicked { index: usize, position: Position },
}

/// One invertible action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UndoEntry {
    /// A committed move step: prior position plus the move session as it was
    /// before the step (movement points, cache, pending choice). When the
    /// step pushed a smaller figure aside, its prior position is kept too.
    Move {
        figure: FigureKey,
        from: Position,
        session_before: MoveSession,
        displaced: Option<(FigureKey, Position)>,
    },
    /// A deployment placement.
    DeployPick { figure: FigureKey },
    /// An interact: the board effect to invert and whether an action point
    /// must be handed back to the figure.
    Interact {
        figure: FigureKey,
        effect: InteractUndo,
        restore_action: bool,
    },
    /// A command card played from hand (effect already applied; inversion
    /// restores the hand/discard split only).
    CcPlay { side: Side, card: String },
    /// A command card attached to a deployment card.
    CcPlayDc {
        side: Side,
        card: String,
        target: FigureKey,
    },
    /// An activation-turn pass.
    PassTurn { previous_turn: Side },
}

impl UndoEntry {
    /// Short tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            UndoEntry::Move { .. } => "move",
            UndoEntry::DeployPick { .. } => "deploy_pick",
            UndoEntry::Interact { .. } => "interact",
            UndoEntry::CcPlay { .. } => "cc_play",
            UndoEntry::CcPlayDc { .. } => "cc_play_dc",
            UndoEntry::PassTurn { .. } => "pass_turn",
        }
    }
}
