//! Damage application, defeat, VP crediting, and cleave.

use crate::env::{AttackType, GameEnv};
use crate::state::{FigureKey, GameState, Side};

use super::session::{AttackSession, CombatPhase};
use super::CombatError;

/// Final damage math for a session that is ready to resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageBreakdown {
    pub dice_damage: u32,
    pub surge_damage: u32,
    pub accuracy: u32,
    pub block: u32,
    pub pierce: u32,
    pub effective_block: u32,
    pub dodged: bool,
    /// Ranged attack whose accuracy fell short of the distance.
    pub missed: bool,
    pub final_damage: u32,
}

/// Computes the damage breakdown for the session as currently rolled and
/// spent. Pure; does not touch game state.
pub fn breakdown(session: &AttackSession) -> DamageBreakdown {
    let attack = session.attack_totals();
    let defense = session.defense_totals();

    let accuracy = attack.accuracy + session.bonus_accuracy + session.surge_spent.accuracy;
    let dodged = defense.dodge;
    let missed = session.attack_type == AttackType::Ranged && accuracy < session.distance;

    let pierce = session.bonus_pierce + session.surge_spent.pierce;
    let effective_block = defense.block.saturating_sub(pierce);
    let raw = (attack.damage + session.surge_spent.damage).saturating_sub(effective_block);
    let final_damage = if dodged || missed { 0 } else { raw };

    DamageBreakdown {
        dice_damage: attack.damage,
        surge_damage: session.surge_spent.damage,
        accuracy,
        block: defense.block,
        pierce,
        effective_block,
        dodged,
        missed,
        final_damage,
    }
}

/// What applying damage to one figure did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefeatOutcome {
    pub dealt: u32,
    pub figure_defeated: bool,
    pub group_wiped: bool,
    pub vp_credited: u32,
}

/// Applies damage to a figure's health entry, removing it from the board at
/// zero and crediting kill VP to `credit_to` when the whole group is wiped.
/// Shared by primary resolution, cleave, blast, and damaging abilities.
pub fn apply_damage_to(
    state: &mut GameState,
    target: &FigureKey,
    amount: u32,
    credit_to: Side,
) -> Result<DefeatOutcome, CombatError> {
    let (owner, dealt, figure_defeated, group_wiped, vp_credited, was_activated) = {
        let (owner, slot) = state
            .slot_for_mut(target)
            .ok_or_else(|| CombatError::UnknownFigure(target.clone()))?;
        let health = slot
            .health_mut(target.figure)
            .ok_or_else(|| CombatError::UnknownFigure(target.clone()))?;

        let dealt = health.apply_damage(amount);
        let figure_defeated = health.is_defeated();
        let group_wiped = slot.is_defeated();

        let mut vp_credited = 0;
        if group_wiped && !slot.vp_credited {
            slot.vp_credited = true;
            vp_credited = match slot.sub_cost {
                Some(sub) => sub * slot.figures.len() as u32,
                None => slot.cost,
            };
        }
        (owner, dealt, figure_defeated, group_wiped, vp_credited, slot.activated)
    };

    if figure_defeated {
        state.board.remove(target);
        state.moves_in_progress.remove(target);
    }
    if vp_credited > 0 {
        // Free the activation slot for the rest of the match.
        let owner_state = state.player_mut(owner);
        owner_state.activations_total = owner_state.activations_total.saturating_sub(1);
        if !was_activated {
            owner_state.activations_remaining = owner_state.activations_remaining.saturating_sub(1);
        }
        state.player_mut(credit_to).vp.add_kills(vp_credited);
    }

    Ok(DefeatOutcome {
        dealt,
        figure_defeated,
        group_wiped,
        vp_credited,
    })
}

/// Human-readable result of a resolution step, for combat logs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub log: Vec<String>,
    pub damage: u32,
    pub defeated: Vec<FigureKey>,
    pub vp_gained: u32,
    /// Non-empty when the attack now waits on a cleave target choice.
    pub cleave_targets: Vec<FigureKey>,
}

/// Resolves the pending attack: damage, conditions, recover, blast, defeat,
/// VP, and the cleave hand-off. The session must be `ReadyToResolve`.
pub fn resolve_pending(
    state: &mut GameState,
    _env: &GameEnv<'_>,
) -> Result<ResolveSummary, CombatError> {
    let session = state
        .pending_combat
        .as_ref()
        .ok_or(CombatError::NoPendingCombat)?;
    session.expect_phase(CombatPhase::ReadyToResolve)?;

    let session = session.clone();
    let result = breakdown(&session);
    let attacker_side = session.attacker_side;
    let negated = result.dodged || result.missed;

    let mut summary = ResolveSummary {
        damage: result.final_damage,
        ..Default::default()
    };
    if result.dodged {
        summary.log.push(format!(
            "{} dodges the attack from {}",
            session.defender, session.attacker
        ));
    } else if result.missed {
        summary.log.push(format!(
            "Attack from {} misses: accuracy {} under range {}",
            session.attacker, result.accuracy, session.distance
        ));
    } else {
        summary.log.push(format!(
            "{} hits {} for {} ({} dice + {} surge - {} block after {} pierce)",
            session.attacker,
            session.defender,
            result.final_damage,
            result.dice_damage,
            result.surge_damage,
            result.effective_block,
            result.pierce,
        ));
    }

    if !negated {
        // Conditions land even when block absorbs all damage.
        if let Some((_, slot)) = state.slot_for_mut(&session.defender) {
            for condition in &session.surge_spent.conditions {
                if let Some(set) = slot.conditions.get_mut(session.defender.figure as usize) {
                    set.insert(condition.flag());
                    summary
                        .log
                        .push(format!("{} is {}", session.defender, condition));
                }
            }
        }

        if session.surge_spent.recover > 0
            && let Some((_, slot)) = state.slot_for_mut(&session.attacker)
            && let Some(health) = slot.health_mut(session.attacker.figure)
        {
            let healed = health.recover(session.surge_spent.recover);
            if healed > 0 {
                summary
                    .log
                    .push(format!("{} recovers {}", session.attacker, healed));
            }
        }

        if result.final_damage > 0 {
            let outcome =
                apply_damage_to(state, &session.defender, result.final_damage, attacker_side)?;
            record_defeat(&mut summary, &session.defender, outcome);
        }

        // Blast splashes every other figure adjacent to the target.
        if session.surge_spent.blast > 0 {
            let splash: Vec<FigureKey> = Side::ALL
                .into_iter()
                .flat_map(|side| state.board.figures_of(side).cloned().collect::<Vec<_>>())
                .filter(|key| {
                    *key != session.defender
                        && *key != session.attacker
                        && state.board.are_adjacent(key, &session.defender)
                })
                .collect();
            for key in splash {
                let outcome =
                    apply_damage_to(state, &key, session.surge_spent.blast, attacker_side)?;
                summary
                    .log
                    .push(format!("Blast hits {} for {}", key, outcome.dealt));
                record_defeat(&mut summary, &key, outcome);
            }
        }
    }

    // Cleave: melee splash assigned to a chosen adjacent enemy.
    let cleave = session.surge_spent.cleave;
    let mut cleave_targets = Vec::new();
    if cleave > 0 && !negated && session.attack_type == AttackType::Melee {
        cleave_targets = state
            .board
            .adjacent_enemies(&session.attacker)
            .into_iter()
            .filter(|key| *key != session.defender)
            .collect();
    }

    if cleave_targets.is_empty() {
        state.pending_combat = None;
    } else if let Some(session_state) = state.pending_combat.as_mut() {
        session_state.phase = CombatPhase::CleavePending;
        session_state.cleave_available = cleave;
        summary.cleave_targets = cleave_targets;
    }

    Ok(summary)
}

/// Applies cleave damage to the chosen target (or declines it) and closes
/// the combat session.
pub fn resolve_cleave(
    state: &mut GameState,
    target: Option<FigureKey>,
) -> Result<ResolveSummary, CombatError> {
    let session = state
        .pending_combat
        .as_ref()
        .ok_or(CombatError::NoPendingCombat)?;
    session.expect_phase(CombatPhase::CleavePending)?;
    let attacker = session.attacker.clone();
    let attacker_side = session.attacker_side;
    let defender = session.defender.clone();
    let cleave = session.cleave_available;

    let mut summary = ResolveSummary::default();
    if let Some(target) = target {
        let legal = target != defender
            && state.board.owner_of(&target) == Some(attacker_side.opponent())
            && state.board.are_adjacent(&attacker, &target);
        if !legal {
            return Err(CombatError::InvalidCleaveTarget(target));
        }
        let outcome = apply_damage_to(state, &target, cleave, attacker_side)?;
        summary
            .log
            .push(format!("Cleave hits {} for {}", target, outcome.dealt));
        summary.damage = outcome.dealt;
        record_defeat(&mut summary, &target, outcome);
    } else {
        summary.log.push("Cleave declined".to_string());
    }

    state.pending_combat = None;
    Ok(summary)
}

fn record_defeat(summary: &mut ResolveSummary, target: &FigureKey, outcome: DefeatOutcome) {
    if outcome.figure_defeated {
        summary.defeated.push(target.clone());
        summary.log.push(format!("{target} is defeated"));
    }
    if outcome.vp_credited > 0 {
        summary.vp_gained += outcome.vp_credited;
        summary
            .log
            .push(format!("{} VP for wiping the group", outcome.vp_credited));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::{AttackDie, AttackFace, DefenseDie, DefenseFace};
    use crate::combat::session::AttackSession;
    use crate::env::{AttackType, GameEnv};
    use crate::state::{DeploymentSlot, Footprint, Orientation, Position};

    fn state_with_combatants() -> GameState {
        let mut state = GameState::new("g", "a", "b", 7);
        state
            .player_mut(Side::Red)
            .squad
            .push(DeploymentSlot::new("Vader", 0, 18, None, 1, 16));
        state
            .player_mut(Side::Blue)
            .squad
            .push(DeploymentSlot::new("Trooper", 0, 6, Some(2), 2, 3));
        state.player_mut(Side::Blue).activations_remaining = 1;
        state.player_mut(Side::Blue).activations_total = 1;
        state.board.place(
            FigureKey::new("Vader", 0, 0),
            Side::Red,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(1, 1),
        );
        state.board.place(
            FigureKey::new("Trooper", 0, 0),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(2, 1),
        );
        state.board.place(
            FigureKey::new("Trooper", 0, 1),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(1, 2),
        );
        state
    }

    fn ready_session(damage: u8, surge: u8, block: u8, evade: u8, dodge: bool) -> AttackSession {
        let mut session = AttackSession::new(
            FigureKey::new("Vader", 0, 0),
            Side::Red,
            FigureKey::new("Trooper", 0, 0),
            AttackType::Melee,
            1,
            vec![AttackDie::Red],
            vec![DefenseDie::Black],
            Vec::new(),
        );
        session.attack_rolls = vec![AttackFace {
            accuracy: 0,
            damage,
            surge,
        }];
        session.defense_rolls = vec![DefenseFace {
            block,
            evade,
            dodge,
        }];
        session.phase = CombatPhase::ReadyToResolve;
        session
    }

    #[test]
    fn damage_is_dice_plus_surge_minus_block() {
        // Scenario: 3 damage + 1 surge unspent vs 1 block -> 2 damage.
        let session = ready_session(3, 1, 1, 0, false);
        let result = breakdown(&session);
        assert_eq!(result.final_damage, 2);
    }

    #[test]
    fn dodge_zeroes_everything() {
        let mut session = ready_session(5, 2, 0, 0, true);
        session.surge_spent.damage = 4;
        let result = breakdown(&session);
        assert!(result.dodged);
        assert_eq!(result.final_damage, 0);
    }

    #[test]
    fn damage_never_negative() {
        let session = ready_session(1, 0, 4, 0, false);
        assert_eq!(breakdown(&session).final_damage, 0);
    }

    #[test]
    fn ranged_accuracy_gate() {
        let mut session = ready_session(3, 0, 0, 0, false);
        session.attack_type = AttackType::Ranged;
        session.distance = 4;
        session.attack_rolls[0].accuracy = 3;
        assert!(breakdown(&session).missed);
        session.bonus_accuracy = 1;
        assert!(!breakdown(&session).missed);
    }

    #[test]
    fn partial_group_defeat_credits_nothing() {
        let mut state = state_with_combatants();
        state.pending_combat = Some(ready_session(3, 0, 0, 0, false));
        let env = GameEnv::empty();
        let summary = resolve_pending(&mut state, &env).unwrap();
        assert_eq!(summary.vp_gained, 0);
        assert!(!state.board.is_placed(&FigureKey::new("Trooper", 0, 0)));
        assert!(state.board.is_placed(&FigureKey::new("Trooper", 0, 1)));
        assert_eq!(state.player(Side::Red).vp.total, 0);
        // Activation slot still held by the surviving figure.
        assert_eq!(state.player(Side::Blue).activations_remaining, 1);
    }

    #[test]
    fn wiping_the_group_credits_sub_cost_per_figure() {
        let mut state = state_with_combatants();
        // First figure down.
        state.pending_combat = Some(ready_session(3, 0, 0, 0, false));
        resolve_pending(&mut state, &GameEnv::empty()).unwrap();
        // Second figure down.
        let mut second = ready_session(3, 0, 0, 0, false);
        second.defender = FigureKey::new("Trooper", 0, 1);
        state.pending_combat = Some(second);
        let summary = resolve_pending(&mut state, &GameEnv::empty()).unwrap();
        // sub_cost 2 x 2 figures.
        assert_eq!(summary.vp_gained, 4);
        assert_eq!(state.player(Side::Red).vp.kills, 4);
        assert!(state.player(Side::Red).vp.is_consistent());
        assert_eq!(state.player(Side::Blue).activations_remaining, 0);
        assert_eq!(state.player(Side::Blue).activations_total, 0);
    }

    #[test]
    fn cleave_waits_for_target_then_reuses_damage_path() {
        let mut state = state_with_combatants();
        let mut session = ready_session(3, 0, 0, 0, false);
        session.surge_spent.cleave = 2;
        state.pending_combat = Some(session);
        let summary = resolve_pending(&mut state, &GameEnv::empty()).unwrap();
        let target = FigureKey::new("Trooper", 0, 1);
        assert_eq!(summary.cleave_targets, vec![target.clone()]);
        assert_eq!(
            state.pending_combat.as_ref().map(|s| s.phase),
            Some(CombatPhase::CleavePending)
        );

        let cleave = resolve_cleave(&mut state, Some(target.clone())).unwrap();
        assert_eq!(cleave.damage, 2);
        assert!(state.pending_combat.is_none());
        // 2 of 3 health gone, figure still standing.
        assert!(state.board.is_placed(&target));
    }

    #[test]
    fn declined_cleave_closes_the_session() {
        let mut state = state_with_combatants();
        let mut session = ready_session(3, 0, 0, 0, false);
        session.surge_spent.cleave = 1;
        state.pending_combat = Some(session);
        resolve_pending(&mut state, &GameEnv::empty()).unwrap();
        resolve_cleave(&mut state, None).unwrap();
        assert!(state.pending_combat.is_none());
    }
}
