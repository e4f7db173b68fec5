//! Round and phase state machine.
//!
//! Drives the match through setup, deployment, and the repeating
//! activation/status loop, and evaluates the data-driven mission rules at
//! the fixed end-of-round points. Every transition is precondition-guarded;
//! correctness never depends on message arrival order.

use crate::config::GameConfig;
use crate::env::{GameEnv, MissionRule, OracleError};
use crate::state::{GameState, Position, Side};

/// Top-level phases of a match.
///
/// `EndOfRound` holds which player's end-of-round window is open; the
/// initiative player's window always comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GamePhase {
    Setup,
    InitiativeDetermined,
    DeploymentZoneChosen,
    #[strum(to_string = "Deploying({side})")]
    Deploying { side: Side },
    Activation,
    #[strum(to_string = "EndOfRound({window})")]
    EndOfRound { window: Side },
    Ended,
}

/// Returns the winner if either side has reached the VP target. When both
/// cross it in the same scoring step, the higher total wins and a tie goes
/// to the initiative holder.
pub fn check_win(state: &GameState) -> Option<Side> {
    let target = state.rules.vp_target;
    let red = state.player(Side::Red).vp.total;
    let blue = state.player(Side::Blue).vp.total;
    if red < target && blue < target {
        return None;
    }
    if red > blue {
        Some(Side::Red)
    } else if blue > red {
        Some(Side::Blue)
    } else {
        Some(state.initiative)
    }
}

/// Resets per-round activation bookkeeping for both sides.
fn reset_activations(state: &mut GameState) {
    for side in Side::ALL {
        let count = state.player(side).undefeated_cards();
        let player = state.player_mut(side);
        player.activations_remaining = count;
        player.activations_total = count;
        for slot in &mut player.squad {
            slot.activated = false;
        }
    }
}

/// Enters the first activation phase after both sides finished deploying.
pub fn begin_first_round(state: &mut GameState, env: &GameEnv<'_>) -> Result<Vec<String>, OracleError> {
    state.current_round = 1;
    reset_activations(state);
    state.activation_turn = state.initiative;
    state.phase = GamePhase::Activation;
    let mut log = vec![format!("Round 1 begins; {} has initiative", state.initiative)];
    log.extend(run_start_of_round_rules(state, env)?);
    Ok(log)
}

/// Fixed end-of-round processing, step (1): mission scoring. Each rule
/// re-evaluates the win condition immediately so a game-ending score is
/// caught mid-sequence.
pub fn run_end_of_round_scoring(
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<Vec<String>, OracleError> {
    let Some(mission_id) = state.selected_mission.clone() else {
        return Ok(Vec::new());
    };
    let mission = env.missions()?.mission_or_default(&mission_id);

    let mut log = Vec::new();
    for rule in &mission.end_of_round {
        log.extend(apply_rule(state, env, rule)?);
        if let Some(winner) = check_win(state) {
            log.push(format!("{winner} reaches the victory point target"));
            state.end_game(Some(winner));
            return Ok(log);
        }
    }
    Ok(log)
}

/// Start-of-round mission rules; runs after the round counter increments.
pub fn run_start_of_round_rules(
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<Vec<String>, OracleError> {
    let Some(mission_id) = state.selected_mission.clone() else {
        return Ok(Vec::new());
    };
    let mission = env.missions()?.mission_or_default(&mission_id);
    let mut log = Vec::new();
    for rule in &mission.start_of_round {
        log.extend(apply_rule(state, env, rule)?);
    }
    Ok(log)
}

/// Step (4) of end-of-round processing: ready all cards, draw command cards,
/// pass initiative, increment the round.
pub fn status_phase(state: &mut GameState, env: &GameEnv<'_>) -> Result<Vec<String>, OracleError> {
    let mut log = Vec::new();

    // Draws are computed before initiative passes: terminal control is
    // scored against the board as the round ended.
    for side in Side::ALL {
        let terminals = controlled_terminals(state, env, side)?;
        let player = state.player_mut(side);
        if player.no_status_draw {
            player.no_status_draw = false;
            log.push(format!("{side} draws no command cards this round"));
            continue;
        }
        let drawn = player.draw(GameConfig::BASE_STATUS_DRAW + terminals);
        log.push(format!("{side} draws {drawn} command card(s)"));
    }

    reset_activations(state);
    state.moves_in_progress.clear();
    state.pending_combat = None;

    state.initiative = state.initiative.opponent();
    state.activation_turn = state.initiative;
    state.current_round += 1;
    state.phase = GamePhase::Activation;
    log.push(format!(
        "Round {} begins; {} has initiative",
        state.current_round, state.initiative
    ));

    log.extend(run_start_of_round_rules(state, env)?);
    Ok(log)
}

/// A side controls a cell when it has a figure on or adjacent to it and the
/// opponent has none. Terminals and panels share this definition.
fn controls_cell(state: &GameState, side: Side, cell: Position) -> bool {
    let presence = |s: Side| {
        state.board.figures_of(s).any(|key| {
            state
                .board
                .cells_of(key)
                .iter()
                .any(|c| *c == cell || c.is_adjacent(cell))
        })
    };
    presence(side) && !presence(side.opponent())
}

/// Controlled terminal count for status-phase draws.
pub fn controlled_terminals(
    state: &GameState,
    env: &GameEnv<'_>,
    side: Side,
) -> Result<usize, OracleError> {
    let Some(mission_id) = state.selected_mission.as_ref() else {
        return Ok(0);
    };
    let mission = env.missions()?.mission_or_default(mission_id);
    Ok(mission
        .terminals
        .iter()
        .filter(|cell| controls_cell(state, side, **cell))
        .count())
}

/// A side controls a zone when it has a figure inside and the opponent has
/// none.
fn controls_zone(state: &GameState, env: &GameEnv<'_>, side: Side, zone: &str) -> bool {
    let Ok(map) = env.map() else {
        return false;
    };
    let cells = map.named_zone(zone);
    let presence = |s: Side| {
        state.board.figures_of(s).any(|key| {
            state
                .board
                .cells_of(key)
                .iter()
                .any(|c| cells.contains(c))
        })
    };
    presence(side) && !presence(side.opponent())
}

fn apply_rule(
    state: &mut GameState,
    env: &GameEnv<'_>,
    rule: &MissionRule,
) -> Result<Vec<String>, OracleError> {
    let mut log = Vec::new();
    match rule {
        MissionRule::AreaControl { zone, vp } => {
            for side in Side::ALL {
                if controls_zone(state, env, side, zone) {
                    state.player_mut(side).vp.add_objectives(*vp);
                    log.push(format!("{side} controls {zone}: +{vp} VP"));
                }
            }
        }

        MissionRule::TokenControl { kind, vp_per_token } => {
            for side in Side::ALL {
                let held = state
                    .board
                    .tokens
                    .iter()
                    .filter(|token| {
                        token.kind == *kind
                            && token
                                .carried_by
                                .as_ref()
                                .and_then(|key| state.board.owner_of(key))
                                == Some(side)
                    })
                    .count() as u32;
                if held > 0 {
                    let vp = held * vp_per_token;
                    state.player_mut(side).vp.add_objectives(vp);
                    log.push(format!("{side} holds {held} {kind} token(s): +{vp} VP"));
                }
            }
        }

        MissionRule::Delivery { kind, zone, vp } => {
            let cells = env.map()?.named_zone(zone);
            let mut delivered: Vec<(usize, Side)> = Vec::new();
            for (index, token) in state.board.tokens.iter().enumerate() {
                if token.kind != *kind {
                    continue;
                }
                let Some(carrier) = token.carried_by.as_ref() else {
                    continue;
                };
                let in_zone = state
                    .board
                    .cells_of(carrier)
                    .iter()
                    .any(|c| cells.contains(c));
                if in_zone && let Some(side) = state.board.owner_of(carrier) {
                    delivered.push((index, side));
                }
            }
            // Remove back-to-front so indices stay valid.
            for (index, side) in delivered.into_iter().rev() {
                state.board.tokens.remove(index);
                state.player_mut(side).vp.add_objectives(*vp);
                log.push(format!("{side} delivers a {kind} token: +{vp} VP"));
            }
        }

        MissionRule::PanelControl { cell, vp } => {
            for side in Side::ALL {
                if controls_cell(state, side, *cell) {
                    state.player_mut(side).vp.add_objectives(*vp);
                    log.push(format!("{side} controls the panel at {cell}: +{vp} VP"));
                }
            }
        }

        MissionRule::CounterFromHandSize { counter } => {
            let value = state.player(state.initiative).hand.len() as i32;
            state.board.counters.insert(counter.clone(), value);
            log.push(format!("Counter \"{counter}\" set to {value}"));
        }
    }
    Ok(log)
}

/// Seeds mission tokens onto the board at setup.
pub fn seed_mission_tokens(state: &mut GameState, env: &GameEnv<'_>) -> Result<(), OracleError> {
    let Some(mission_id) = state.selected_mission.clone() else {
        return Ok(());
    };
    let mission = env.missions()?.mission_or_default(&mission_id);
    if let Some(target) = mission.vp_target {
        state.rules.vp_target = target;
    }
    for (kind, cell) in mission.tokens {
        state
            .board
            .tokens
            .push(crate::state::TokenState::on_cell(kind, cell));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MissionDef, MissionOracle};
    use crate::state::{
        DeploymentSlot, FigureKey, Footprint, Orientation, TokenKind, TokenState,
    };

    struct OneMission(MissionDef);

    impl MissionOracle for OneMission {
        fn mission(&self, id: &str) -> Option<MissionDef> {
            (self.0.id == id).then(|| self.0.clone())
        }
    }

    fn state_with_squads() -> GameState {
        let mut state = GameState::new("g", "a", "b", 1);
        for (side, name) in [(Side::Red, "Vader"), (Side::Blue, "Luke Skywalker")] {
            state
                .player_mut(side)
                .squad
                .push(DeploymentSlot::new(name, 0, 10, None, 1, 10));
            state.board.place(
                FigureKey::new(name, 0, 0),
                side,
                Footprint::Single,
                Orientation::Horizontal,
                match side {
                    Side::Red => Position::new(0, 0),
                    Side::Blue => Position::new(5, 5),
                },
            );
        }
        state.selected_mission = Some("m1".into());
        state
    }

    #[test]
    fn status_phase_passes_initiative_and_increments_round() {
        let mut state = state_with_squads();
        state.current_round = 1;
        state.initiative = Side::Red;
        let mission = OneMission(MissionDef::plain_skirmish("m1"));
        let env = GameEnv::new(None, None, Some(&mission), None);

        status_phase(&mut state, &env).unwrap();
        assert_eq!(state.current_round, 2);
        assert_eq!(state.initiative, Side::Blue);
        assert_eq!(state.activation_turn, Side::Blue);
        assert_eq!(state.phase, GamePhase::Activation);
        assert_eq!(state.player(Side::Red).activations_remaining, 1);
    }

    #[test]
    fn no_draw_effect_skips_one_status_draw() {
        let mut state = state_with_squads();
        state.player_mut(Side::Blue).deck = vec!["cc1".into(), "cc2".into()];
        state.player_mut(Side::Blue).no_status_draw = true;
        let mission = OneMission(MissionDef::plain_skirmish("m1"));
        let env = GameEnv::new(None, None, Some(&mission), None);

        status_phase(&mut state, &env).unwrap();
        assert!(state.player(Side::Blue).hand.is_empty());
        assert!(!state.player(Side::Blue).no_status_draw);

        status_phase(&mut state, &env).unwrap();
        assert_eq!(state.player(Side::Blue).hand.len(), 1);
    }

    #[test]
    fn scoring_rule_ends_game_mid_sequence() {
        let mut state = state_with_squads();
        state.rules.vp_target = 4;
        let mut mission = MissionDef::plain_skirmish("m1");
        mission.end_of_round = vec![
            MissionRule::TokenControl {
                kind: TokenKind::Crate,
                vp_per_token: 4,
            },
            // Never reached once the first rule ends the game.
            MissionRule::CounterFromHandSize {
                counter: "late".into(),
            },
        ];
        state.board.tokens.push(TokenState {
            kind: TokenKind::Crate,
            position: None,
            carried_by: Some(FigureKey::new("Vader", 0, 0)),
        });
        let oracle = OneMission(mission);
        let env = GameEnv::new(None, None, Some(&oracle), None);

        run_end_of_round_scoring(&mut state, &env).unwrap();
        assert!(state.ended);
        assert_eq!(state.winner, Some(Side::Red));
        assert!(!state.board.counters.contains_key("late"));
    }

    #[test]
    fn win_tie_goes_to_initiative() {
        let mut state = state_with_squads();
        state.rules.vp_target = 10;
        state.initiative = Side::Blue;
        state.player_mut(Side::Red).vp.add_kills(10);
        state.player_mut(Side::Blue).vp.add_objectives(10);
        assert_eq!(check_win(&state), Some(Side::Blue));
    }
}
