//! Scripted ability and command-card effect resolver.
//!
//! Every scripted effect resolves through [`resolve_ability`] into one of
//! three outcome shapes: fully applied, needs further player input (a
//! discrete option or a board space), or manual. The manual variant is a
//! first-class outcome, not an error: when an effect cannot be safely
//! auto-applied in the current context, the caller offers "play anyway" or
//! "unplay" so the consuming card is never silently lost.

use crate::action::RenderFlags;
use crate::combat::{CombatPhase, RollSide, apply_damage_to};
use crate::env::{AbilityEffect, GameEnv, OracleError};
use crate::movement::MoveSession;
use crate::state::{FigureKey, GameState, Position, Side, TokenState};

/// Effect fully applied by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedAbility {
    pub log: Vec<String>,
    pub refresh: RenderFlags,
    pub drew_cards: usize,
    /// When set, part of the result (drawn cards) is visible to this side
    /// only; the transport renders it privately.
    pub reveal_to: Option<Side>,
}

/// Three-way resolution contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbilityOutcome {
    /// State was mutated; the summary describes what happened.
    Applied(AppliedAbility),
    /// The player must pick one of these labeled options, then resolution
    /// is re-invoked with the chosen index. Option lists are recomputed
    /// deterministically, so the index stays meaningful.
    NeedsChoice { options: Vec<String> },
    /// The player must pick one of these cells, then resolution is
    /// re-invoked with the chosen space.
    NeedsSpace { spaces: Vec<Position> },
    /// Cannot be safely auto-resolved; the humans apply the card text.
    Manual { message: String },
}

/// Who is resolving and what they already chose.
#[derive(Clone, Debug, Default)]
pub struct AbilityContext {
    pub side: Side,
    /// Figure the effect originates from, when one exists (ranged effects
    /// measure from it).
    pub source_figure: Option<FigureKey>,
    pub chosen_option: Option<usize>,
    pub chosen_space: Option<Position>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityError {
    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),

    #[error("chosen option {index} is not in the offered list")]
    UnknownChoice { index: usize },

    #[error("chosen space {0} is not in the offered list")]
    UnknownSpace(Position),

    #[error("combat error while applying effect: {0}")]
    Combat(#[from] crate::combat::CombatError),
}

fn applied(log: impl Into<String>, refresh: RenderFlags) -> AbilityOutcome {
    AbilityOutcome::Applied(AppliedAbility {
        log: vec![log.into()],
        refresh,
        drew_cards: 0,
        reveal_to: None,
    })
}

fn manual(message: impl Into<String>) -> AbilityOutcome {
    AbilityOutcome::Manual {
        message: message.into(),
    }
}

/// Figures of `side` currently on the board, in key order.
fn placed_figures(state: &GameState, side: Side) -> Vec<FigureKey> {
    state.board.figures_of(side).cloned().collect()
}

/// Resolves one scripted ability in the given context.
///
/// The function reads and writes the passed game state directly; callers
/// re-invoke it with the player's choice when an outcome asks for one.
pub fn resolve_ability(
    state: &mut GameState,
    env: &GameEnv<'_>,
    ability_id: &str,
    ctx: &AbilityContext,
) -> Result<AbilityOutcome, AbilityError> {
    let Some(def) = env.cards()?.ability(ability_id) else {
        return Ok(manual(format!(
            "No scripted resolution for \"{ability_id}\"; resolve it manually"
        )));
    };

    match def.effect {
        AbilityEffect::Draw { count } => {
            let drawn = state.player_mut(ctx.side).draw(count as usize);
            Ok(AbilityOutcome::Applied(AppliedAbility {
                log: vec![format!("{} draws {drawn} command card(s)", ctx.side)],
                refresh: RenderFlags::HANDS,
                drew_cards: drawn,
                reveal_to: Some(ctx.side),
            }))
        }

        AbilityEffect::GainVp { amount } => {
            state.player_mut(ctx.side).vp.add_objectives(amount);
            Ok(applied(
                format!("{} gains {amount} VP", ctx.side),
                RenderFlags::LOG,
            ))
        }

        AbilityEffect::DealDamage { amount, range } => {
            let Some(source) = ctx.source_figure.as_ref() else {
                return Ok(manual("Effect needs a source figure on the board"));
            };
            let targets: Vec<FigureKey> = placed_figures(state, ctx.side.opponent())
                .into_iter()
                .filter(|key| {
                    state
                        .board
                        .distance_between(source, key)
                        .is_some_and(|d| d <= range as u32)
                })
                .collect();
            if targets.is_empty() {
                return Ok(manual("No valid targets in range"));
            }
            match ctx.chosen_option {
                None => Ok(AbilityOutcome::NeedsChoice {
                    options: targets.iter().map(|k| k.to_string()).collect(),
                }),
                Some(index) => {
                    let target = targets
                        .get(index)
                        .ok_or(AbilityError::UnknownChoice { index })?
                        .clone();
                    let outcome = apply_damage_to(state, &target, amount, ctx.side)?;
                    Ok(applied(
                        format!("{target} suffers {} damage", outcome.dealt),
                        RenderFlags::BOARD | RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::Recover { amount } => {
            let targets = placed_figures(state, ctx.side);
            if targets.is_empty() {
                return Ok(manual("No friendly figures to heal"));
            }
            match ctx.chosen_option {
                None => Ok(AbilityOutcome::NeedsChoice {
                    options: targets.iter().map(|k| k.to_string()).collect(),
                }),
                Some(index) => {
                    let target = targets
                        .get(index)
                        .ok_or(AbilityError::UnknownChoice { index })?
                        .clone();
                    let healed = state
                        .slot_for_mut(&target)
                        .and_then(|(_, slot)| slot.health_mut(target.figure))
                        .map(|health| health.recover(amount))
                        .unwrap_or(0);
                    Ok(applied(
                        format!("{target} recovers {healed}"),
                        RenderFlags::BOARD | RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::ApplyCondition { condition, range } => {
            let Some(source) = ctx.source_figure.as_ref() else {
                return Ok(manual("Effect needs a source figure on the board"));
            };
            let targets: Vec<FigureKey> = placed_figures(state, ctx.side.opponent())
                .into_iter()
                .filter(|key| {
                    state
                        .board
                        .distance_between(source, key)
                        .is_some_and(|d| d <= range as u32)
                })
                .collect();
            if targets.is_empty() {
                return Ok(manual("No valid targets in range"));
            }
            match ctx.chosen_option {
                None => Ok(AbilityOutcome::NeedsChoice {
                    options: targets.iter().map(|k| k.to_string()).collect(),
                }),
                Some(index) => {
                    let target = targets
                        .get(index)
                        .ok_or(AbilityError::UnknownChoice { index })?
                        .clone();
                    if let Some((_, slot)) = state.slot_for_mut(&target)
                        && let Some(set) = slot.conditions.get_mut(target.figure as usize)
                    {
                        set.insert(condition.flag());
                    }
                    Ok(applied(
                        format!("{target} is {condition}"),
                        RenderFlags::BOARD | RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::RemoveCondition { condition } => {
            let targets: Vec<FigureKey> = placed_figures(state, ctx.side)
                .into_iter()
                .filter(|key| {
                    state
                        .slot_for(key)
                        .and_then(|(_, slot)| slot.conditions.get(key.figure as usize))
                        .is_some_and(|set| set.contains(condition.flag()))
                })
                .collect();
            if targets.is_empty() {
                return Ok(manual(format!("No friendly figure is {condition}")));
            }
            match ctx.chosen_option {
                None => Ok(AbilityOutcome::NeedsChoice {
                    options: targets.iter().map(|k| k.to_string()).collect(),
                }),
                Some(index) => {
                    let target = targets
                        .get(index)
                        .ok_or(AbilityError::UnknownChoice { index })?
                        .clone();
                    if let Some((_, slot)) = state.slot_for_mut(&target)
                        && let Some(set) = slot.conditions.get_mut(target.figure as usize)
                    {
                        set.remove(condition.flag());
                    }
                    Ok(applied(
                        format!("{target} is no longer {condition}"),
                        RenderFlags::BOARD | RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::GrantMovement { points } => {
            let Some(active) = state.current_activation.as_ref() else {
                return Ok(manual("No activation in progress"));
            };
            if active.side != ctx.side {
                return Ok(manual("Movement can only be granted during your own activation"));
            }
            let figures: Vec<FigureKey> = active
                .actions
                .keys()
                .filter(|key| state.board.is_placed(key))
                .cloned()
                .collect();
            if figures.is_empty() {
                return Ok(manual("No figure of the active group is on the board"));
            }
            match ctx.chosen_option {
                None if figures.len() > 1 => Ok(AbilityOutcome::NeedsChoice {
                    options: figures.iter().map(|k| k.to_string()).collect(),
                }),
                choice => {
                    let index = choice.unwrap_or(0);
                    let figure = figures
                        .get(index)
                        .ok_or(AbilityError::UnknownChoice { index })?
                        .clone();
                    state
                        .moves_in_progress
                        .entry(figure.clone())
                        .or_insert_with(|| MoveSession::new(figure.clone()))
                        .add_points(points);
                    Ok(applied(
                        format!("{figure} gains {points} movement point(s)"),
                        RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::GrantAttackDice { ref dice } => {
            with_precombat_session(state, ctx.side, true, |session| {
                session.attack_pool.extend(dice.iter().copied());
                format!("Attack pool gains {} bonus die/dice", dice.len())
            })
        }

        AbilityEffect::GrantDefenseDice { ref dice } => {
            with_precombat_session(state, ctx.side, false, |session| {
                session.defense_pool.extend(dice.iter().copied());
                format!("Defense pool gains {} bonus die/dice", dice.len())
            })
        }

        AbilityEffect::GrantPierce { amount } => {
            with_precombat_session(state, ctx.side, true, |session| {
                session.bonus_pierce += amount as u32;
                format!("Attack gains Pierce {amount}")
            })
        }

        AbilityEffect::GrantAccuracy { amount } => {
            with_precombat_session(state, ctx.side, true, |session| {
                session.bonus_accuracy += amount as u32;
                format!("Attack gains {amount} Accuracy")
            })
        }

        AbilityEffect::GrantSurge { amount } => {
            with_precombat_session(state, ctx.side, true, |session| {
                session.bonus_surge += amount as u32;
                format!("Attack gains {amount} Surge")
            })
        }

        AbilityEffect::GrantReroll { side, count } => {
            let attacker_grant = side == RollSide::Attack;
            with_precombat_session(state, ctx.side, attacker_grant, |session| {
                match side {
                    RollSide::Attack => session.attacker_rerolls += count,
                    RollSide::Defense => session.defender_rerolls += count,
                }
                format!("{side} gains {count} reroll(s)")
            })
        }

        AbilityEffect::BlockStatusDraw => {
            state.player_mut(ctx.side.opponent()).no_status_draw = true;
            Ok(applied(
                format!("{} skips the next status-phase draw", ctx.side.opponent()),
                RenderFlags::LOG,
            ))
        }

        AbilityEffect::PlaceToken { kind, ref zone } => {
            let spaces: Vec<Position> = env
                .map()?
                .named_zone(zone)
                .into_iter()
                .filter(|cell| {
                    !state.board.is_occupied(*cell, None) && state.board.token_at(*cell).is_none()
                })
                .collect();
            if spaces.is_empty() {
                return Ok(manual(format!("No free space in zone \"{zone}\"")));
            }
            match ctx.chosen_space {
                None => Ok(AbilityOutcome::NeedsSpace { spaces }),
                Some(space) => {
                    if !spaces.contains(&space) {
                        return Err(AbilityError::UnknownSpace(space));
                    }
                    state.board.tokens.push(TokenState::on_cell(kind, space));
                    Ok(applied(
                        format!("{kind} token placed at {space}"),
                        RenderFlags::BOARD | RenderFlags::LOG,
                    ))
                }
            }
        }

        AbilityEffect::Manual => Ok(manual(format!(
            "\"{}\" must be resolved manually",
            def.id
        ))),
    }
}

/// Applies a pre-combat modifier if a pending attack is in its pre-combat
/// window and the resolving side owns the right end of it. Anything else is
/// a manual outcome: the timing is ambiguous, not illegal.
fn with_precombat_session(
    state: &mut GameState,
    side: Side,
    attacker_side_effect: bool,
    mutate: impl FnOnce(&mut crate::combat::AttackSession) -> String,
) -> Result<AbilityOutcome, AbilityError> {
    let Some(session) = state.pending_combat.as_mut() else {
        return Ok(manual("No attack in progress"));
    };
    if session.phase != CombatPhase::PreCombatWindow {
        return Ok(manual("The attack is past its pre-combat window"));
    }
    let expected = if attacker_side_effect {
        session.attacker_side
    } else {
        session.attacker_side.opponent()
    };
    if side != expected {
        return Ok(manual("This effect belongs to the other side of the attack"));
    }
    let log = mutate(session);
    Ok(applied(log, RenderFlags::COMBAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{
        AbilityDef, AttackType, CardOracle, CommandCard, DeploymentCard, MapOracle,
    };
    use crate::state::{Condition, DeploymentSlot, Footprint, Orientation};

    struct Abilities(Vec<AbilityDef>);

    impl CardOracle for Abilities {
        fn deployment_card(&self, _name: &str) -> Option<DeploymentCard> {
            None
        }

        fn command_card(&self, _name: &str) -> Option<CommandCard> {
            None
        }

        fn ability(&self, id: &str) -> Option<AbilityDef> {
            self.0.iter().find(|a| a.id == id).cloned()
        }
    }

    struct NoMap;

    impl MapOracle for NoMap {
        fn dimensions(&self) -> crate::env::MapDimensions {
            crate::env::MapDimensions::new(0, 0)
        }

        fn terrain(&self, _position: Position) -> Option<crate::env::TerrainKind> {
            None
        }

        fn doors(&self) -> Vec<crate::env::Door> {
            Vec::new()
        }

        fn deployment_zone(&self, _zone: crate::env::DeploymentZone) -> Vec<Position> {
            Vec::new()
        }
    }

    fn state_with_figures() -> GameState {
        let mut state = GameState::new("g", "a", "b", 5);
        state
            .player_mut(Side::Red)
            .squad
            .push(DeploymentSlot::new("Saboteur", 0, 3, None, 1, 5));
        state
            .player_mut(Side::Blue)
            .squad
            .push(DeploymentSlot::new("Trooper", 0, 6, None, 1, 4));
        state.board.place(
            FigureKey::new("Saboteur", 0, 0),
            Side::Red,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(0, 0),
        );
        state.board.place(
            FigureKey::new("Trooper", 0, 0),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(2, 0),
        );
        state
    }

    fn env_with<'a>(cards: &'a Abilities, map: &'a NoMap) -> GameEnv<'a> {
        GameEnv::new(Some(cards), Some(map), None, None)
    }

    #[test]
    fn unknown_ability_is_manual_not_error() {
        let cards = Abilities(Vec::new());
        let map = NoMap;
        let env = env_with(&cards, &map);
        let mut state = state_with_figures();
        let outcome = resolve_ability(
            &mut state,
            &env,
            "ancient-technique",
            &AbilityContext {
                side: Side::Red,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(outcome, AbilityOutcome::Manual { .. }));
    }

    #[test]
    fn damage_effect_offers_targets_then_applies() {
        let cards = Abilities(vec![AbilityDef {
            id: "grenade".into(),
            effect: AbilityEffect::DealDamage { amount: 2, range: 3 },
        }]);
        let map = NoMap;
        let env = env_with(&cards, &map);
        let mut state = state_with_figures();
        let mut ctx = AbilityContext {
            side: Side::Red,
            source_figure: Some(FigureKey::new("Saboteur", 0, 0)),
            ..Default::default()
        };

        let outcome = resolve_ability(&mut state, &env, "grenade", &ctx).unwrap();
        let AbilityOutcome::NeedsChoice { options } = outcome else {
            panic!("expected a choice, got {outcome:?}");
        };
        assert_eq!(options, vec!["Trooper-0-0".to_string()]);

        ctx.chosen_option = Some(0);
        let outcome = resolve_ability(&mut state, &env, "grenade", &ctx).unwrap();
        assert!(matches!(outcome, AbilityOutcome::Applied(_)));
        let slot = state.player(Side::Blue).squad[0].clone();
        assert_eq!(slot.figures[0].current, 2);
    }

    #[test]
    fn condition_round_trip() {
        let cards = Abilities(vec![
            AbilityDef {
                id: "stun-blast".into(),
                effect: AbilityEffect::ApplyCondition {
                    condition: Condition::Stunned,
                    range: 4,
                },
            },
            AbilityDef {
                id: "field-medic".into(),
                effect: AbilityEffect::RemoveCondition {
                    condition: Condition::Stunned,
                },
            },
        ]);
        let map = NoMap;
        let env = env_with(&cards, &map);
        let mut state = state_with_figures();

        let ctx = AbilityContext {
            side: Side::Red,
            source_figure: Some(FigureKey::new("Saboteur", 0, 0)),
            chosen_option: Some(0),
            ..Default::default()
        };
        resolve_ability(&mut state, &env, "stun-blast", &ctx).unwrap();
        assert!(state.player(Side::Blue).squad[0].conditions[0]
            .contains(Condition::Stunned.flag()));

        let ctx = AbilityContext {
            side: Side::Blue,
            chosen_option: Some(0),
            ..Default::default()
        };
        resolve_ability(&mut state, &env, "field-medic", &ctx).unwrap();
        assert!(!state.player(Side::Blue).squad[0].conditions[0]
            .contains(Condition::Stunned.flag()));
    }

    #[test]
    fn combat_grants_outside_window_are_manual() {
        let cards = Abilities(vec![AbilityDef {
            id: "take-aim".into(),
            effect: AbilityEffect::GrantPierce { amount: 2 },
        }]);
        let map = NoMap;
        let env = env_with(&cards, &map);
        let mut state = state_with_figures();
        let outcome = resolve_ability(
            &mut state,
            &env,
            "take-aim",
            &AbilityContext {
                side: Side::Red,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(outcome, AbilityOutcome::Manual { .. }));
    }

    #[test]
    fn precombat_grant_lands_on_the_session() {
        let cards = Abilities(vec![AbilityDef {
            id: "take-aim".into(),
            effect: AbilityEffect::GrantPierce { amount: 2 },
        }]);
        let map = NoMap;
        let env = env_with(&cards, &map);
        let mut state = state_with_figures();
        state.pending_combat = Some(crate::combat::AttackSession::new(
            FigureKey::new("Saboteur", 0, 0),
            Side::Red,
            FigureKey::new("Trooper", 0, 0),
            AttackType::Ranged,
            2,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ));
        resolve_ability(
            &mut state,
            &env,
            "take-aim",
            &AbilityContext {
                side: Side::Red,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(state.pending_combat.unwrap().bonus_pierce, 2);
    }
}
