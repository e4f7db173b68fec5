//! Activation-flow transitions: activating deployment cards, passing and
//! ending turns, closing the activation phase, and end-of-round windows.

use std::collections::BTreeMap;

use crate::config::GameConfig;
use crate::env::{GameEnv, OracleError};
use crate::round::{GamePhase, run_end_of_round_scoring, status_phase};
use crate::state::{ActiveGroup, ConditionSet, GameState, Side, UndoEntry};

use super::{ActionOutcome, ActionTransition, RenderFlags};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationError {
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: GamePhase },

    #[error("it is not your activation turn")]
    NotYourTurn,

    #[error("an activation is already in progress")]
    ActivationInProgress,

    #[error("no activation in progress")]
    NoActivationInProgress,

    #[error("deployment card {name} (group {group}) not in your squad")]
    UnknownCard { name: String, group: u8 },

    #[error("that group already activated this round")]
    AlreadyActivated,

    #[error("that group has been defeated")]
    GroupDefeated,

    #[error("no activations remaining")]
    NoActivationsRemaining,

    #[error("passing requires the opponent to have strictly more activations ({opponent} vs {own})")]
    PassNotAllowed { own: u8, opponent: u8 },

    #[error("activations are still outstanding")]
    ActivationsOutstanding,

    #[error("an attack is still being resolved")]
    CombatOutstanding,

    #[error("the end-of-round window belongs to the other player")]
    NotYourWindow,

    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Spends one of the side's activations on a deployment card, granting each
/// of its standing figures two actions. Stunned figures burn one action
/// shaking the condition off.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivateCardAction {
    pub side: Side,
    pub dc_name: String,
    pub group: u8,
}

impl ActionTransition for ActivateCardAction {
    type Error = ActivationError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Activation {
            return Err(ActivationError::WrongPhase { phase: state.phase });
        }
        if state.activation_turn != self.side {
            return Err(ActivationError::NotYourTurn);
        }
        if state.current_activation.is_some() {
            return Err(ActivationError::ActivationInProgress);
        }
        if state.player(self.side).activations_remaining == 0 {
            return Err(ActivationError::NoActivationsRemaining);
        }
        let slot = state
            .player(self.side)
            .squad
            .iter()
            .find(|s| s.dc_name == self.dc_name && s.group == self.group)
            .ok_or_else(|| ActivationError::UnknownCard {
                name: self.dc_name.clone(),
                group: self.group,
            })?;
        if slot.is_defeated() {
            return Err(ActivationError::GroupDefeated);
        }
        if slot.activated {
            return Err(ActivationError::AlreadyActivated);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let mut actions = BTreeMap::new();
        let mut log = vec![format!("{} activates {}", self.side, self.dc_name)];
        {
            let player = state.player_mut(self.side);
            player.activations_remaining -= 1;
            let slot = player
                .squad
                .iter_mut()
                .find(|s| s.dc_name == self.dc_name && s.group == self.group)
                .ok_or_else(|| ActivationError::UnknownCard {
                    name: self.dc_name.clone(),
                    group: self.group,
                })?;
            slot.activated = true;
            for index in slot.alive().collect::<Vec<_>>() {
                let key = slot.figure_key(index);
                let mut budget = GameConfig::ACTIONS_PER_ACTIVATION;
                let conditions = &mut slot.conditions[index as usize];
                if conditions.contains(ConditionSet::STUNNED) {
                    conditions.remove(ConditionSet::STUNNED);
                    budget -= 1;
                    log.push(format!("{key} spends an action shaking off Stun"));
                }
                actions.insert(key, budget);
            }
        }
        state.current_activation = Some(ActiveGroup {
            side: self.side,
            dc_name: self.dc_name.clone(),
            group: self.group,
            actions,
        });
        Ok(ActionOutcome {
            log,
            refresh: RenderFlags::BOARD | RenderFlags::LOG,
            data: Default::default(),
        })
    }
}

/// Ends the current activation, or — when none is open — passes the
/// activation turn. Passing is only legal when the opponent has strictly
/// more remaining activations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndTurnAction {
    pub side: Side,
}

impl ActionTransition for EndTurnAction {
    type Error = ActivationError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Activation {
            return Err(ActivationError::WrongPhase { phase: state.phase });
        }
        if state.activation_turn != self.side {
            return Err(ActivationError::NotYourTurn);
        }
        if state.pending_combat.is_some() {
            return Err(ActivationError::CombatOutstanding);
        }
        if state.current_activation.is_none() {
            let own = state.player(self.side).activations_remaining;
            let opponent = state.player(self.side.opponent()).activations_remaining;
            if opponent <= own {
                return Err(ActivationError::PassNotAllowed { own, opponent });
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let opponent = self.side.opponent();
        if let Some(active) = state.current_activation.take() {
            // Movement sessions of the group end with the activation.
            for key in active.actions.keys() {
                state.moves_in_progress.remove(key);
            }
            if state.player(opponent).activations_remaining > 0 {
                state.activation_turn = opponent;
            }
            Ok(ActionOutcome::log(
                format!("{} ends the activation of {}", self.side, active.dc_name),
                RenderFlags::BOARD | RenderFlags::LOG,
            ))
        } else {
            state.undo_stack.push(UndoEntry::PassTurn {
                previous_turn: self.side,
            });
            state.activation_turn = opponent;
            Ok(ActionOutcome::log(
                format!("{} passes the turn", self.side),
                RenderFlags::LOG,
            ))
        }
    }
}

/// Closes the activation phase and runs end-of-round step (1): mission
/// scoring. Refused while either side has unspent activations or an
/// activation still holds unspent actions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndActivationPhaseAction {
    pub side: Side,
}

impl ActionTransition for EndActivationPhaseAction {
    type Error = ActivationError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Activation {
            return Err(ActivationError::WrongPhase { phase: state.phase });
        }
        if state.pending_combat.is_some() {
            return Err(ActivationError::CombatOutstanding);
        }
        if state
            .current_activation
            .as_ref()
            .is_some_and(ActiveGroup::has_unspent_actions)
        {
            return Err(ActivationError::ActivationsOutstanding);
        }
        let outstanding = Side::ALL
            .into_iter()
            .any(|s| state.player(s).activations_remaining > 0);
        if outstanding || state.current_activation.is_some() {
            return Err(ActivationError::ActivationsOutstanding);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let mut outcome = ActionOutcome::log(
            format!("Round {} scoring", state.current_round),
            RenderFlags::LOG,
        );
        outcome.log.extend(run_end_of_round_scoring(state, env)?);
        if state.ended {
            return Ok(outcome);
        }
        state.phase = GamePhase::EndOfRound {
            window: state.initiative,
        };
        outcome.log.push(format!(
            "End-of-round window: {} first",
            state.initiative
        ));
        Ok(outcome)
    }
}

/// Closes one player's end-of-round window. The initiative player's window
/// opens first; when the second window closes, the status phase runs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndRoundWindowAction {
    pub side: Side,
}

impl ActionTransition for EndRoundWindowAction {
    type Error = ActivationError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        match state.phase {
            GamePhase::EndOfRound { window } if window == self.side => Ok(()),
            GamePhase::EndOfRound { .. } => Err(ActivationError::NotYourWindow),
            phase => Err(ActivationError::WrongPhase { phase }),
        }
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        if self.side == state.initiative {
            state.phase = GamePhase::EndOfRound {
                window: self.side.opponent(),
            };
            return Ok(ActionOutcome::log(
                format!("{}'s end-of-round window", self.side.opponent()),
                RenderFlags::LOG,
            ));
        }
        let log = status_phase(state, env)?;
        Ok(ActionOutcome {
            log,
            refresh: RenderFlags::BOARD | RenderFlags::HANDS | RenderFlags::LOG,
            data: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeploymentSlot;

    fn activation_state() -> GameState {
        let mut state = GameState::new("g", "a", "b", 3);
        for (side, name) in [(Side::Red, "Vader"), (Side::Blue, "Trooper")] {
            state
                .player_mut(side)
                .squad
                .push(DeploymentSlot::new(name, 0, 10, None, 1, 8));
            let player = state.player_mut(side);
            player.activations_remaining = 1;
            player.activations_total = 1;
        }
        state.phase = GamePhase::Activation;
        state.initiative = Side::Red;
        state.activation_turn = Side::Red;
        state
    }

    #[test]
    fn activation_grants_two_actions_per_figure() {
        let mut state = activation_state();
        let action = ActivateCardAction {
            side: Side::Red,
            dc_name: "Vader".into(),
            group: 0,
        };
        action.pre_validate(&state, &GameEnv::empty()).unwrap();
        action.apply(&mut state, &GameEnv::empty()).unwrap();
        let active = state.current_activation.as_ref().unwrap();
        assert_eq!(active.actions.values().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(state.player(Side::Red).activations_remaining, 0);
    }

    #[test]
    fn stunned_figures_lose_an_action() {
        let mut state = activation_state();
        state.player_mut(Side::Red).squad[0].conditions[0] = ConditionSet::STUNNED;
        let action = ActivateCardAction {
            side: Side::Red,
            dc_name: "Vader".into(),
            group: 0,
        };
        action.apply(&mut state, &GameEnv::empty()).unwrap();
        let active = state.current_activation.as_ref().unwrap();
        assert_eq!(active.actions.values().copied().collect::<Vec<_>>(), vec![1]);
        assert!(!state.player(Side::Red).squad[0].conditions[0].contains(ConditionSet::STUNNED));
    }

    #[test]
    fn double_activation_is_rejected() {
        let mut state = activation_state();
        let action = ActivateCardAction {
            side: Side::Red,
            dc_name: "Vader".into(),
            group: 0,
        };
        action.apply(&mut state, &GameEnv::empty()).unwrap();
        state.current_activation = None;
        state.player_mut(Side::Red).activations_remaining = 1;
        assert_eq!(
            action.pre_validate(&state, &GameEnv::empty()),
            Err(ActivationError::AlreadyActivated)
        );
    }

    #[test]
    fn pass_needs_strict_activation_deficit() {
        let mut state = activation_state();
        // 1 vs 1: pass refused.
        let pass = EndTurnAction { side: Side::Red };
        assert!(matches!(
            pass.pre_validate(&state, &GameEnv::empty()),
            Err(ActivationError::PassNotAllowed { .. })
        ));
        // 0 vs 1: pass allowed and undoable.
        state.player_mut(Side::Red).activations_remaining = 0;
        state.player_mut(Side::Blue).activations_remaining = 1;
        pass.pre_validate(&state, &GameEnv::empty()).unwrap();
        pass.apply(&mut state, &GameEnv::empty()).unwrap();
        assert_eq!(state.activation_turn, Side::Blue);
        assert!(matches!(
            state.undo_stack.last(),
            Some(UndoEntry::PassTurn { .. })
        ));
    }

    #[test]
    fn phase_cannot_end_with_outstanding_activations() {
        let state = activation_state();
        let action = EndActivationPhaseAction { side: Side::Red };
        assert_eq!(
            action.pre_validate(&state, &GameEnv::empty()),
            Err(ActivationError::ActivationsOutstanding)
        );
    }
}
