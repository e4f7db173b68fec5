//! Action execution pipeline.
//!
//! The [`GameEngine`] is the authoritative reducer for [`GameState`]. Every
//! external request flows through [`GameEngine::execute`], which drives the
//! three-phase transition pipeline, bumps the action nonce, maintains the
//! undo log contract, and re-checks the win condition after each mutation.

mod errors;
mod transition;

pub use errors::{ExecuteError, TransitionPhase, TransitionPhaseError, UndoError};

use crate::action::{Action, ActionOutcome, RenderFlags};
use crate::env::GameEnv;
use crate::round::check_win;
use crate::state::{GameState, InteractUndo, Side, UndoEntry};

pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GameState {
        self.state
    }

    /// Executes one structured action.
    ///
    /// On success the action nonce increments (feeding dice seeds and log
    /// ordering) and the win condition is re-evaluated, so a kill or an
    /// objective that crosses the VP target ends the game immediately. A
    /// failed action leaves the record untouched apart from pre-validated
    /// apply errors, which per-transition contracts keep side-effect free.
    pub fn execute(
        &mut self,
        env: &GameEnv<'_>,
        action: &Action,
    ) -> Result<ActionOutcome, ExecuteError> {
        if self.state.ended && !matches!(action, Action::KillGame { .. }) {
            return Err(ExecuteError::GameEnded);
        }

        let mut outcome = match action {
            Action::Undo { side } => self.undo(*side)?,
            Action::KillGame { side } => self.kill(*side),
            _ => transition::execute_transition(action, self.state, env)?,
        };

        self.state.nonce += 1;

        if !self.state.ended
            && let Some(winner) = check_win(self.state)
        {
            self.state.end_game(Some(winner));
            outcome
                .log
                .push(format!("{winner} wins the game"));
            outcome.refresh |= RenderFlags::BOARD | RenderFlags::LOG;
        }

        debug_assert!(self.state.invariants_hold());
        Ok(outcome)
    }

    /// Pops the last undoable action and inverts it.
    fn undo(&mut self, side: Side) -> Result<ActionOutcome, ExecuteError> {
        let entry = self.state.undo_stack.pop().ok_or(UndoError::Empty)?;
        let tag = entry.tag();
        match entry {
            UndoEntry::Move {
                figure,
                from,
                session_before,
                displaced,
            } => {
                self.state
                    .board
                    .move_to(&figure, from)
                    .ok_or_else(|| UndoError::Mismatch(format!("{figure} is not placed")))?;
                if let Some((pushed, position)) = displaced {
                    self.state.board.move_to(&pushed, position);
                }
                self.state.moves_in_progress.insert(figure, session_before);
            }

            UndoEntry::DeployPick { figure } => {
                self.state.board.remove(&figure);
            }

            UndoEntry::Interact {
                figure,
                effect,
                restore_action,
            } => {
                match effect {
                    InteractUndo::DoorOpened(id) => {
                        self.state.board.open_doors.remove(&id);
                    }
                    InteractUndo::TokenPicked { index, position } => {
                        let token = self
                            .state
                            .board
                            .tokens
                            .get_mut(index)
                            .ok_or_else(|| UndoError::Mismatch("token vanished".into()))?;
                        token.carried_by = None;
                        token.position = Some(position);
                    }
                }
                if restore_action
                    && let Some(active) = self.state.current_activation.as_mut()
                {
                    active.restore_action(&figure);
                }
            }

            UndoEntry::CcPlay { side, card } => {
                let player = self.state.player_mut(side);
                let index = player
                    .discard
                    .iter()
                    .rposition(|c| *c == card)
                    .ok_or_else(|| UndoError::Mismatch(format!("{card} not in discard")))?;
                player.discard.remove(index);
                player.hand.push(card);
            }

            UndoEntry::CcPlayDc { side, card, target } => {
                let player = self.state.player_mut(side);
                let slot = player
                    .slot_mut(&target)
                    .ok_or_else(|| UndoError::Mismatch(format!("{target} has no slot")))?;
                let index = slot
                    .attachments
                    .iter()
                    .rposition(|c| *c == card)
                    .ok_or_else(|| UndoError::Mismatch(format!("{card} not attached")))?;
                slot.attachments.remove(index);
                player.hand.push(card);
            }

            UndoEntry::PassTurn { previous_turn } => {
                self.state.activation_turn = previous_turn;
            }
        }

        Ok(ActionOutcome::log(
            format!("{side} undoes the last action ({tag})"),
            RenderFlags::BOARD | RenderFlags::HANDS | RenderFlags::LOG,
        ))
    }

    /// Administrative abort. No winner is declared and nothing is undoable
    /// afterwards.
    fn kill(&mut self, side: Side) -> ActionOutcome {
        self.state.end_game(None);
        ActionOutcome::log(
            format!("{side} ended the game"),
            RenderFlags::BOARD | RenderFlags::LOG,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DeploymentSlot, FigureKey, Footprint, Orientation, Position};

    fn state() -> GameState {
        let mut state = GameState::new("g", "a", "b", 11);
        state
            .player_mut(Side::Red)
            .squad
            .push(DeploymentSlot::new("Scout", 0, 3, None, 1, 3));
        state
    }

    #[test]
    fn undo_on_empty_stack_is_rejected() {
        let mut state = state();
        let env = GameEnv::empty();
        let mut engine = GameEngine::new(&mut state);
        assert!(matches!(
            engine.execute(&env, &Action::Undo { side: Side::Red }),
            Err(ExecuteError::Undo(UndoError::Empty))
        ));
    }

    #[test]
    fn undo_deploy_removes_the_figure() {
        let mut state = state();
        let key = FigureKey::new("Scout", 0, 0);
        state.board.place(
            key.clone(),
            Side::Red,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(1, 1),
        );
        state
            .undo_stack
            .push(UndoEntry::DeployPick { figure: key.clone() });

        let env = GameEnv::empty();
        let mut engine = GameEngine::new(&mut state);
        engine
            .execute(&env, &Action::Undo { side: Side::Red })
            .unwrap();
        assert!(!state.board.is_placed(&key));
    }

    #[test]
    fn actions_after_game_end_are_rejected() {
        let mut state = state();
        state.end_game(Some(Side::Blue));
        let env = GameEnv::empty();
        let mut engine = GameEngine::new(&mut state);
        assert!(matches!(
            engine.execute(&env, &Action::Undo { side: Side::Red }),
            Err(ExecuteError::GameEnded)
        ));
    }

    #[test]
    fn nonce_increments_per_executed_action() {
        let mut state = state();
        state.undo_stack.push(UndoEntry::PassTurn {
            previous_turn: Side::Red,
        });
        let env = GameEnv::empty();
        let mut engine = GameEngine::new(&mut state);
        engine
            .execute(&env, &Action::Undo { side: Side::Red })
            .unwrap();
        assert_eq!(state.nonce, 1);
    }

    #[test]
    fn reaching_the_target_ends_the_game() {
        let mut state = state();
        state.rules.vp_target = 5;
        state.player_mut(Side::Red).vp.add_kills(5);
        state.undo_stack.push(UndoEntry::PassTurn {
            previous_turn: Side::Red,
        });
        let env = GameEnv::empty();
        let mut engine = GameEngine::new(&mut state);
        let outcome = engine
            .execute(&env, &Action::Undo { side: Side::Red })
            .unwrap();
        assert!(state.ended);
        assert_eq!(state.winner, Some(Side::Red));
        assert!(outcome.log.iter().any(|l| l.contains("wins the game")));
    }
}
