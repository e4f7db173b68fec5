//! Combat transitions: one action per sub-step of the attack state machine.
//!
//! Declaring consumes an action from the attacker's budget; everything after
//! that is gated purely by the session phase, so duplicate or stale clicks
//! fall out as phase errors without touching state.

use crate::combat::{
    AttackSession, CombatError, CombatPhase, RollSide, resolve_cleave, resolve_pending,
};
use crate::env::{AbilityEffect, AttackType, GameEnv};
use crate::los::footprints_have_los;
use crate::round::GamePhase;
use crate::state::{FigureKey, GameState, Side};

use super::{ActionOutcome, ActionTransition, OutcomeData, RenderFlags};

/// Declares an attack against a target in range and line of sight.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackDeclareAction {
    pub side: Side,
    pub attacker: FigureKey,
    pub target: FigureKey,
}

impl ActionTransition for AttackDeclareAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Activation {
            return Err(CombatError::NotInActivationPhase { phase: state.phase });
        }
        if state.activation_turn != self.side {
            return Err(CombatError::NotYourTurn);
        }
        if state.pending_combat.is_some() {
            return Err(CombatError::CombatInProgress);
        }
        let Some(active) = state.current_activation.as_ref() else {
            return Err(CombatError::NotInActivation(self.attacker.clone()));
        };
        if active.side != self.side || !active.contains(&self.attacker) {
            return Err(CombatError::NotInActivation(self.attacker.clone()));
        }
        if active.actions_of(&self.attacker) == 0 {
            return Err(CombatError::NoActionsLeft(self.attacker.clone()));
        }
        if state.board.owner_of(&self.target) != Some(self.side.opponent())
            || !state.figure_is_alive(&self.target)
        {
            return Err(CombatError::InvalidTarget(self.target.clone()));
        }

        let card = env.cards()?.deployment_card_or_default(&self.attacker.dc_name);
        let distance = state
            .board
            .distance_between(&self.attacker, &self.target)
            .ok_or_else(|| CombatError::UnknownFigure(self.target.clone()))?;
        let (min, max) = match card.attack_type {
            AttackType::Melee => (1, 1),
            // max_range 0 reads as accuracy-limited only.
            AttackType::Ranged => (
                card.min_range as u32,
                if card.max_range == 0 {
                    u32::MAX
                } else {
                    card.max_range as u32
                },
            ),
        };
        if distance < min || distance > max {
            return Err(CombatError::OutOfRange { distance, min, max });
        }

        let attacker_cells = state.board.cells_of(&self.attacker);
        let target_cells = state.board.cells_of(&self.target);
        if !footprints_have_los(
            env.map()?,
            &state.board.open_doors,
            &attacker_cells,
            &target_cells,
        ) {
            return Err(CombatError::NoLineOfSight);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let cards = env.cards()?;
        let attacker_card = cards.deployment_card_or_default(&self.attacker.dc_name);
        let defender_card = cards.deployment_card_or_default(&self.target.dc_name);
        let distance = state
            .board
            .distance_between(&self.attacker, &self.target)
            .ok_or_else(|| CombatError::UnknownFigure(self.target.clone()))?;

        if let Some(active) = state.current_activation.as_mut() {
            active.spend_action(&self.attacker);
        }

        let mut session = AttackSession::new(
            self.attacker.clone(),
            self.side,
            self.target.clone(),
            attacker_card.attack_type,
            distance,
            attacker_card.attack_pool.clone(),
            defender_card.defense_pool.clone(),
            attacker_card.surges.clone(),
        );

        // Innate specials that modify attacks apply before the window opens.
        for id in &attacker_card.specials {
            if let Some(def) = cards.ability(id) {
                match def.effect {
                    AbilityEffect::GrantReroll {
                        side: RollSide::Attack,
                        count,
                    } => session.attacker_rerolls += count,
                    AbilityEffect::GrantAccuracy { amount } => {
                        session.bonus_accuracy += amount as u32
                    }
                    AbilityEffect::GrantPierce { amount } => session.bonus_pierce += amount as u32,
                    AbilityEffect::GrantSurge { amount } => session.bonus_surge += amount as u32,
                    AbilityEffect::GrantAttackDice { dice } => session.attack_pool.extend(dice),
                    _ => {}
                }
            }
        }
        for id in &defender_card.specials {
            if let Some(def) = cards.ability(id) {
                match def.effect {
                    AbilityEffect::GrantReroll {
                        side: RollSide::Defense,
                        count,
                    } => session.defender_rerolls += count,
                    AbilityEffect::GrantDefenseDice { dice } => session.defense_pool.extend(dice),
                    _ => {}
                }
            }
        }

        state.pending_combat = Some(session);
        Ok(ActionOutcome::log(
            format!(
                "{} attacks {} at range {distance}",
                self.attacker, self.target
            ),
            RenderFlags::COMBAT | RenderFlags::LOG,
        ))
    }
}

fn session_of(state: &GameState) -> Result<&AttackSession, CombatError> {
    state.pending_combat.as_ref().ok_or(CombatError::NoPendingCombat)
}

fn session_of_mut(state: &mut GameState) -> Result<&mut AttackSession, CombatError> {
    state.pending_combat.as_mut().ok_or(CombatError::NoPendingCombat)
}

/// Requires the acting side to own the given end of the pending attack.
fn require_combat_role(state: &GameState, side: Side, attacker_end: bool) -> Result<(), CombatError> {
    let session = session_of(state)?;
    let expected = if attacker_end {
        session.attacker_side
    } else {
        session.attacker_side.opponent()
    };
    if side == expected {
        Ok(())
    } else {
        Err(CombatError::NotYourStep)
    }
}

/// Signals readiness in the pre-combat window.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreCombatReadyAction {
    pub side: Side,
}

impl ActionTransition for PreCombatReadyAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        session_of(state)?.expect_phase(CombatPhase::PreCombatWindow)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let session = session_of_mut(state)?;
        session.mark_ready(self.side)?;
        let message = if session.both_ready() {
            "Both sides ready; roll attack dice".to_string()
        } else {
            format!("{} is ready", self.side)
        };
        Ok(ActionOutcome::log(message, RenderFlags::COMBAT))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollAttackAction {
    pub side: Side,
}

impl ActionTransition for RollAttackAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, true)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let rng = env.rng()?;
        let (game_seed, nonce) = (state.game_seed, state.nonce);
        let session = session_of_mut(state)?;
        session.roll_attack(rng, game_seed, nonce)?;
        let totals = session.attack_totals();
        Ok(ActionOutcome::log(
            format!(
                "Attack roll: {} accuracy, {} damage, {} surge",
                totals.accuracy, totals.damage, totals.surge
            ),
            RenderFlags::COMBAT | RenderFlags::LOG,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollDefenseAction {
    pub side: Side,
}

impl ActionTransition for RollDefenseAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, false)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let rng = env.rng()?;
        let (game_seed, nonce) = (state.game_seed, state.nonce);
        let session = session_of_mut(state)?;
        session.roll_defense(rng, game_seed, nonce)?;
        let totals = session.defense_totals();
        Ok(ActionOutcome::log(
            format!(
                "Defense roll: {} block, {} evade{}",
                totals.block,
                totals.evade,
                if totals.dodge { ", dodge" } else { "" }
            ),
            RenderFlags::COMBAT | RenderFlags::LOG,
        ))
    }
}

/// Rerolls one die of the acting side's pool.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RerollDieAction {
    pub side: Side,
    pub roll_side: RollSide,
    pub index: usize,
}

impl ActionTransition for RerollDieAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, self.roll_side == RollSide::Attack)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let rng = env.rng()?;
        let (game_seed, nonce) = (state.game_seed, state.nonce);
        let session = session_of_mut(state)?;
        session.reroll_die(self.roll_side, self.index, rng, game_seed, nonce)?;
        Ok(ActionOutcome::log(
            format!("{} rerolls die {}", self.side, self.index + 1),
            RenderFlags::COMBAT | RenderFlags::LOG,
        ))
    }
}

/// Ends the acting side's reroll window ("Done").
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RerollDoneAction {
    pub side: Side,
    pub roll_side: RollSide,
}

impl ActionTransition for RerollDoneAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, self.roll_side == RollSide::Attack)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let session = session_of_mut(state)?;
        session.finish_rerolls(self.roll_side)?;
        let message = match session.phase {
            CombatPhase::SurgeSpend => format!(
                "Rerolls finished; {} surge to spend",
                session.surge_budget()
            ),
            CombatPhase::ReadyToResolve => "Rerolls finished; ready to resolve".to_string(),
            _ => "Attacker rerolls finished; defender may reroll".to_string(),
        };
        Ok(ActionOutcome::log(message, RenderFlags::COMBAT))
    }
}

/// Spends surge on one of the attack's surge abilities.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpendSurgeAction {
    pub side: Side,
    pub index: usize,
}

impl ActionTransition for SpendSurgeAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, true)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let session = session_of_mut(state)?;
        let effect = session.spend_surge(self.index)?;
        Ok(ActionOutcome::log(
            format!("Surge spent: {effect:?} ({} left)", session.surge_budget()),
            RenderFlags::COMBAT,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurgeDoneAction {
    pub side: Side,
}

impl ActionTransition for SurgeDoneAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, true)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        session_of_mut(state)?.finish_surge()?;
        Ok(ActionOutcome::log(
            "Surge spending finished",
            RenderFlags::COMBAT,
        ))
    }
}

/// Applies the final damage math and defeat/VP bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolveCombatAction {
    pub side: Side,
}

impl ActionTransition for ResolveCombatAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, true)?;
        session_of(state)?.expect_phase(CombatPhase::ReadyToResolve)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let summary = resolve_pending(state, env)?;
        let data = if summary.cleave_targets.is_empty() {
            OutcomeData::None
        } else {
            OutcomeData::CleaveTargets(summary.cleave_targets.clone())
        };
        Ok(ActionOutcome {
            log: summary.log,
            refresh: RenderFlags::BOARD | RenderFlags::COMBAT | RenderFlags::LOG,
            data,
        })
    }
}

/// Chooses (or declines) the cleave target and closes the attack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CleaveTargetAction {
    pub side: Side,
    pub target: Option<FigureKey>,
}

impl ActionTransition for CleaveTargetAction {
    type Error = CombatError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        require_combat_role(state, self.side, true)?;
        session_of(state)?.expect_phase(CombatPhase::CleavePending)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let summary = resolve_cleave(state, self.target.clone())?;
        Ok(ActionOutcome {
            log: summary.log,
            refresh: RenderFlags::BOARD | RenderFlags::COMBAT | RenderFlags::LOG,
            data: OutcomeData::None,
        })
    }
}
