//! Authoritative match state.
//!
//! This module owns the data structures describing one match: players,
//! board occupancy, transient combat/movement sessions, and the undo log.
//! Runtime layers clone or query this state but mutate it exclusively
//! through the engine.

mod board;
mod common;
mod figure;
mod player;
mod undo;

use std::collections::BTreeMap;

pub use board::{BoardState, TokenKind, TokenState};
pub use common::Position;
pub use figure::{
    FigureHealth, FigureKey, Footprint, FootprintCells, Orientation, ParseFigureKeyError,
};
pub use player::{Condition, ConditionSet, DeploymentSlot, PlayerState, Side, VictoryPoints};
pub use undo::{InteractUndo, UndoEntry};

use crate::combat::AttackSession;
use crate::config::MatchRules;
use crate::env::DeploymentZone;
use crate::movement::MoveSession;
use crate::round::GamePhase;

/// A confirmation the engine is waiting on. Expires after a fixed TTL and
/// must then be re-initiated rather than silently honored.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingConfirmation {
    pub side: Side,
    pub kind: ConfirmKind,
    /// Unix seconds, stamped at the boundary when the confirmation was
    /// created.
    pub created_at: u64,
}

/// What is being confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfirmKind {
    /// A squad over the point limits, held until the player overrides or
    /// resubmits.
    IllegalSquad {
        deployment: Vec<String>,
        command: Vec<String>,
    },
    /// A command card whose effect could not be auto-resolved; confirming
    /// commits the play ("play anyway"), cancelling restores the hand.
    ManualCard { card: String },
}

/// The deployment card currently spending its activation, with the per-figure
/// action budget it was granted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveGroup {
    pub side: Side,
    pub dc_name: String,
    pub group: u8,
    /// Remaining actions per figure of the group.
    pub actions: BTreeMap<FigureKey, u8>,
}

impl ActiveGroup {
    pub fn contains(&self, key: &FigureKey) -> bool {
        self.actions.contains_key(key)
    }

    pub fn actions_of(&self, key: &FigureKey) -> u8 {
        self.actions.get(key).copied().unwrap_or(0)
    }

    pub fn spend_action(&mut self, key: &FigureKey) -> bool {
        match self.actions.get_mut(key) {
            Some(actions) if *actions > 0 => {
                *actions -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn restore_action(&mut self, key: &FigureKey) {
        if let Some(actions) = self.actions.get_mut(key) {
            *actions += 1;
        }
    }

    pub fn has_unspent_actions(&self) -> bool {
        self.actions.values().any(|a| *a > 0)
    }
}

/// Canonical record of one match. Everything a restart needs lives here;
/// transient sessions (combat, movement) are persisted with the record so an
/// in-flight attack survives a crash.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub game_id: String,

    /// Seed for deterministic dice; set once at creation.
    pub game_seed: u64,

    /// Increments after every executed action. Feeds dice seeds and gives
    /// logs a stable ordering key.
    pub nonce: u64,

    players: [PlayerState; 2],

    pub phase: GamePhase,
    pub current_round: u32,
    pub initiative: Side,
    /// Whose turn it is to activate within the activation phase.
    pub activation_turn: Side,
    pub current_activation: Option<ActiveGroup>,

    pub selected_map: Option<String>,
    pub selected_mission: Option<String>,
    /// Zone chosen by the initiative player; the opponent gets the other.
    pub initiative_zone: Option<DeploymentZone>,
    pub rules: MatchRules,

    pub board: BoardState,

    pub pending_combat: Option<AttackSession>,
    pub moves_in_progress: BTreeMap<FigureKey, MoveSession>,
    pub pending_confirmation: Option<PendingConfirmation>,

    pub undo_stack: Vec<UndoEntry>,

    pub ended: bool,
    pub winner: Option<Side>,
}

impl GameState {
    pub fn new(
        game_id: impl Into<String>,
        red_user: impl Into<String>,
        blue_user: impl Into<String>,
        game_seed: u64,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            game_seed,
            nonce: 0,
            players: [PlayerState::new(red_user), PlayerState::new(blue_user)],
            phase: GamePhase::Setup,
            current_round: 0,
            initiative: Side::Red,
            activation_turn: Side::Red,
            current_activation: None,
            selected_map: None,
            selected_mission: None,
            initiative_zone: None,
            rules: MatchRules::default(),
            board: BoardState::default(),
            pending_combat: None,
            moves_in_progress: BTreeMap::new(),
            pending_confirmation: None,
            undo_stack: Vec::new(),
            ended: false,
            winner: None,
        }
    }

    pub fn player(&self, side: Side) -> &PlayerState {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut PlayerState {
        &mut self.players[side.index()]
    }

    /// The seat owning `user_id`, if any.
    pub fn side_of_user(&self, user_id: &str) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.player(*side).user_id == user_id)
    }

    /// The side and deployment slot owning a figure.
    pub fn slot_for(&self, key: &FigureKey) -> Option<(Side, &DeploymentSlot)> {
        Side::ALL.into_iter().find_map(|side| {
            self.player(side)
                .slot(key)
                .map(|slot| (side, slot))
        })
    }

    pub fn slot_for_mut(&mut self, key: &FigureKey) -> Option<(Side, &mut DeploymentSlot)> {
        let side = self.slot_for(key)?.0;
        self.player_mut(side).slot_mut(key).map(|slot| (side, slot))
    }

    /// Whether the figure exists and still has health.
    pub fn figure_is_alive(&self, key: &FigureKey) -> bool {
        self.slot_for(key)
            .and_then(|(_, slot)| slot.health(key.figure))
            .is_some_and(|h| !h.is_defeated())
    }

    /// Ends the match. The undo log is cleared: nothing is undoable after
    /// the end of the game.
    pub fn end_game(&mut self, winner: Option<Side>) {
        self.ended = true;
        self.winner = winner;
        self.phase = GamePhase::Ended;
        self.undo_stack.clear();
        self.pending_combat = None;
        self.moves_in_progress.clear();
        self.pending_confirmation = None;
    }

    /// Both sides have finished deploying.
    pub fn all_deployed(&self) -> bool {
        Side::ALL.into_iter().all(|s| self.player(s).deployed)
    }

    /// Debug-check of the record-level invariants from the rules:
    /// VP totals, activation counters, and health bounds.
    pub fn invariants_hold(&self) -> bool {
        Side::ALL.into_iter().all(|side| {
            let player = self.player(side);
            player.vp.is_consistent()
                && player.activations_remaining <= player.activations_total
                && player
                    .squad
                    .iter()
                    .all(|slot| slot.figures.iter().all(|h| h.current <= h.max))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_starts_in_setup() {
        let state = GameState::new("g1", "alice", "bob", 99);
        assert_eq!(state.phase, GamePhase::Setup);
        assert_eq!(state.side_of_user("bob"), Some(Side::Blue));
        assert!(state.invariants_hold());
    }

    #[test]
    fn end_game_clears_undo_and_sessions() {
        let mut state = GameState::new("g1", "alice", "bob", 99);
        state.undo_stack.push(UndoEntry::PassTurn {
            previous_turn: Side::Red,
        });
        state.end_game(Some(Side::Blue));
        assert!(state.undo_stack.is_empty());
        assert_eq!(state.winner, Some(Side::Blue));
    }
}
