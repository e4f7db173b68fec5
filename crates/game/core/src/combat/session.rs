//! Per-attack session state machine.

use crate::env::{AttackType, RngOracle, SurgeAbility, SurgeEffect, compute_seed};
use crate::state::{Condition, FigureKey, Side};

use super::dice::{
    AttackDie, AttackFace, AttackTotals, DefenseDie, DefenseFace, DefenseTotals, RollSide,
};
use super::CombatError;

/// Sub-states of one attack, in resolution order. Every transition is
/// guarded; out-of-order requests (stale clicks) are rejected with
/// [`CombatError::WrongPhase`] instead of relying on arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatPhase {
    Declared,
    PreCombatWindow,
    AttackRolled,
    DefenseRolled,
    RerollAttacker,
    RerollDefender,
    SurgeSpend,
    ReadyToResolve,
    Resolved,
    CleavePending,
    Closed,
}

/// Surge conversions accumulated while spending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurgeSpent {
    pub damage: u32,
    pub pierce: u32,
    pub accuracy: u32,
    pub blast: u32,
    pub recover: u32,
    pub cleave: u32,
    pub conditions: Vec<Condition>,
}

/// Transient state of one attack, persisted on the game record after every
/// completed sub-step so a restart resumes exactly where the attack stood.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackSession {
    pub attacker: FigureKey,
    pub attacker_side: Side,
    pub defender: FigureKey,
    pub attack_type: AttackType,
    /// Minimum footprint-pair distance measured at declaration.
    pub distance: u32,

    pub phase: CombatPhase,

    pub attack_pool: Vec<AttackDie>,
    pub defense_pool: Vec<DefenseDie>,
    pub attack_rolls: Vec<AttackFace>,
    pub defense_rolls: Vec<DefenseFace>,

    /// Pre-combat window ready flags; both must be set before dice roll.
    pub attacker_ready: bool,
    pub defender_ready: bool,

    /// Pre-roll modifiers granted by cards and abilities.
    pub bonus_accuracy: u32,
    pub bonus_pierce: u32,
    pub bonus_surge: u32,

    /// Reroll budgets (innate plus granted).
    pub attacker_rerolls: u8,
    pub defender_rerolls: u8,

    /// Surge abilities available to this attack, copied from the card at
    /// declaration time.
    pub surge_abilities: Vec<SurgeAbility>,
    /// Indices into `surge_abilities` already spent (each spendable once).
    pub spent_surges: Vec<usize>,
    pub surge_spent: SurgeSpent,

    /// Cleave damage still to assign after the primary target resolved.
    pub cleave_available: u32,
}

impl AttackSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        attacker: FigureKey,
        attacker_side: Side,
        defender: FigureKey,
        attack_type: AttackType,
        distance: u32,
        attack_pool: Vec<AttackDie>,
        defense_pool: Vec<DefenseDie>,
        surge_abilities: Vec<SurgeAbility>,
    ) -> Self {
        Self {
            attacker,
            attacker_side,
            defender,
            attack_type,
            distance,
            phase: CombatPhase::PreCombatWindow,
            attack_pool,
            defense_pool,
            attack_rolls: Vec::new(),
            defense_rolls: Vec::new(),
            attacker_ready: false,
            defender_ready: false,
            bonus_accuracy: 0,
            bonus_pierce: 0,
            bonus_surge: 0,
            attacker_rerolls: 0,
            defender_rerolls: 0,
            surge_abilities,
            spent_surges: Vec::new(),
            surge_spent: SurgeSpent::default(),
            cleave_available: 0,
        }
    }

    pub fn expect_phase(&self, expected: CombatPhase) -> Result<(), CombatError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CombatError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Marks one side ready in the pre-combat window.
    pub fn mark_ready(&mut self, side: Side) -> Result<(), CombatError> {
        self.expect_phase(CombatPhase::PreCombatWindow)?;
        if side == self.attacker_side {
            self.attacker_ready = true;
        } else {
            self.defender_ready = true;
        }
        Ok(())
    }

    pub fn both_ready(&self) -> bool {
        self.attacker_ready && self.defender_ready
    }

    /// Rolls the attack pool. Each die gets its own seed context so pools of
    /// identical dice still roll independently.
    pub fn roll_attack(
        &mut self,
        rng: &dyn RngOracle,
        game_seed: u64,
        nonce: u64,
    ) -> Result<(), CombatError> {
        self.expect_phase(CombatPhase::PreCombatWindow)?;
        if !self.both_ready() {
            return Err(CombatError::PreCombatNotReady);
        }
        self.attack_rolls = self
            .attack_pool
            .iter()
            .enumerate()
            .map(|(i, die)| die.roll(rng, compute_seed(game_seed, nonce, i as u32)))
            .collect();
        self.phase = CombatPhase::AttackRolled;
        Ok(())
    }

    pub fn roll_defense(
        &mut self,
        rng: &dyn RngOracle,
        game_seed: u64,
        nonce: u64,
    ) -> Result<(), CombatError> {
        self.expect_phase(CombatPhase::AttackRolled)?;
        self.defense_rolls = self
            .defense_pool
            .iter()
            .enumerate()
            .map(|(i, die)| die.roll(rng, compute_seed(game_seed, nonce, 0x100 + i as u32)))
            .collect();
        self.phase = CombatPhase::RerollAttacker;
        Ok(())
    }

    fn reroll_phase_of(side: RollSide) -> CombatPhase {
        match side {
            RollSide::Attack => CombatPhase::RerollAttacker,
            RollSide::Defense => CombatPhase::RerollDefender,
        }
    }

    /// Rerolls one die, replacing its face and recomputing pool totals.
    pub fn reroll_die(
        &mut self,
        side: RollSide,
        index: usize,
        rng: &dyn RngOracle,
        game_seed: u64,
        nonce: u64,
    ) -> Result<(), CombatError> {
        self.expect_phase(Self::reroll_phase_of(side))?;
        let budget = match side {
            RollSide::Attack => &mut self.attacker_rerolls,
            RollSide::Defense => &mut self.defender_rerolls,
        };
        if *budget == 0 {
            return Err(CombatError::NoRerollsLeft);
        }
        match side {
            RollSide::Attack => {
                let die = *self
                    .attack_pool
                    .get(index)
                    .ok_or(CombatError::InvalidDieIndex { index })?;
                self.attack_rolls[index] =
                    die.roll(rng, compute_seed(game_seed, nonce, 0x200 + index as u32));
            }
            RollSide::Defense => {
                let die = *self
                    .defense_pool
                    .get(index)
                    .ok_or(CombatError::InvalidDieIndex { index })?;
                self.defense_rolls[index] =
                    die.roll(rng, compute_seed(game_seed, nonce, 0x300 + index as u32));
            }
        }
        *budget -= 1;
        Ok(())
    }

    /// Ends a reroll sub-phase ("Done"). After the defender finishes, the
    /// dodge check runs: a dodge skips surge spending entirely.
    pub fn finish_rerolls(&mut self, side: RollSide) -> Result<(), CombatError> {
        self.expect_phase(Self::reroll_phase_of(side))?;
        self.phase = match side {
            RollSide::Attack => CombatPhase::RerollDefender,
            RollSide::Defense => {
                if self.defense_totals().dodge || self.surge_budget() == 0 {
                    CombatPhase::ReadyToResolve
                } else {
                    CombatPhase::SurgeSpend
                }
            }
        };
        Ok(())
    }

    pub fn attack_totals(&self) -> AttackTotals {
        AttackTotals::sum(&self.attack_rolls)
    }

    pub fn defense_totals(&self) -> DefenseTotals {
        DefenseTotals::sum(&self.defense_rolls)
    }

    /// Surge available for spending: raw surge minus evade cancellation,
    /// plus granted bonus surge, minus what is already spent.
    pub fn surge_budget(&self) -> u32 {
        let raw = self.attack_totals().surge;
        let cancelled = super::evade_cancelled_surge(raw, self.defense_totals().evade);
        let spent: u32 = self
            .spent_surges
            .iter()
            .map(|i| self.surge_abilities[*i].cost as u32)
            .sum();
        (raw - cancelled + self.bonus_surge).saturating_sub(spent)
    }

    /// Spends one surge ability by index.
    pub fn spend_surge(&mut self, index: usize) -> Result<SurgeEffect, CombatError> {
        self.expect_phase(CombatPhase::SurgeSpend)?;
        let ability = *self
            .surge_abilities
            .get(index)
            .ok_or(CombatError::InvalidSurgeIndex { index })?;
        if self.spent_surges.contains(&index) {
            return Err(CombatError::SurgeAlreadySpent { index });
        }
        if (ability.cost as u32) > self.surge_budget() {
            return Err(CombatError::NotEnoughSurge {
                cost: ability.cost,
                available: self.surge_budget(),
            });
        }
        self.spent_surges.push(index);
        match ability.effect {
            SurgeEffect::Damage(n) => self.surge_spent.damage += n as u32,
            SurgeEffect::Pierce(n) => self.surge_spent.pierce += n as u32,
            SurgeEffect::Accuracy(n) => self.surge_spent.accuracy += n as u32,
            SurgeEffect::Blast(n) => self.surge_spent.blast += n as u32,
            SurgeEffect::Recover(n) => self.surge_spent.recover += n as u32,
            SurgeEffect::Cleave(n) => self.surge_spent.cleave += n as u32,
            SurgeEffect::Condition(c) => self.surge_spent.conditions.push(c),
        }
        Ok(ability.effect)
    }

    /// Attacker finished spending surge.
    pub fn finish_surge(&mut self) -> Result<(), CombatError> {
        self.expect_phase(CombatPhase::SurgeSpend)?;
        self.phase = CombatPhase::ReadyToResolve;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PcgRng;

    fn session() -> AttackSession {
        AttackSession::new(
            FigureKey::new("Vader", 0, 0),
            Side::Red,
            FigureKey::new("Luke Skywalker", 0, 0),
            AttackType::Melee,
            1,
            vec![AttackDie::Red, AttackDie::Red],
            vec![DefenseDie::Black],
            vec![
                SurgeAbility {
                    cost: 1,
                    effect: SurgeEffect::Damage(2),
                },
                SurgeAbility {
                    cost: 2,
                    effect: SurgeEffect::Pierce(3),
                },
            ],
        )
    }

    #[test]
    fn rolling_requires_both_ready() {
        let mut s = session();
        s.mark_ready(Side::Red).unwrap();
        assert!(matches!(
            s.roll_attack(&PcgRng, 1, 1),
            Err(CombatError::PreCombatNotReady)
        ));
        s.mark_ready(Side::Blue).unwrap();
        s.roll_attack(&PcgRng, 1, 1).unwrap();
        assert_eq!(s.phase, CombatPhase::AttackRolled);
        assert_eq!(s.attack_rolls.len(), 2);
    }

    #[test]
    fn out_of_order_requests_are_rejected() {
        let mut s = session();
        assert!(matches!(
            s.roll_defense(&PcgRng, 1, 1),
            Err(CombatError::WrongPhase { .. })
        ));
        assert!(s.spend_surge(0).is_err());
    }

    #[test]
    fn rerolls_consume_budget() {
        let mut s = session();
        s.mark_ready(Side::Red).unwrap();
        s.mark_ready(Side::Blue).unwrap();
        s.roll_attack(&PcgRng, 1, 1).unwrap();
        s.roll_defense(&PcgRng, 1, 1).unwrap();
        s.attacker_rerolls = 1;
        s.reroll_die(RollSide::Attack, 0, &PcgRng, 1, 2).unwrap();
        assert!(matches!(
            s.reroll_die(RollSide::Attack, 1, &PcgRng, 1, 3),
            Err(CombatError::NoRerollsLeft)
        ));
    }

    #[test]
    fn surge_abilities_spend_once() {
        let mut s = session();
        s.phase = CombatPhase::SurgeSpend;
        s.attack_rolls = vec![AttackFace {
            accuracy: 0,
            damage: 2,
            surge: 3,
        }];
        s.spend_surge(0).unwrap();
        assert!(matches!(
            s.spend_surge(0),
            Err(CombatError::SurgeAlreadySpent { .. })
        ));
        s.spend_surge(1).unwrap();
        assert_eq!(s.surge_spent.damage, 2);
        assert_eq!(s.surge_spent.pierce, 3);
        assert_eq!(s.surge_budget(), 0);
    }
}
