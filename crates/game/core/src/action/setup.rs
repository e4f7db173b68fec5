//! Setup-flow transitions: squads, map/mission selection, initiative,
//! deployment, and starting hands.

use crate::config::GameConfig;
use crate::env::{DeploymentZone, GameEnv, OracleError, compute_seed};
use crate::round::{GamePhase, begin_first_round, seed_mission_tokens};
use crate::state::{
    ConfirmKind, DeploymentSlot, FigureKey, GameState, Orientation, PendingConfirmation, Position,
    Side, UndoEntry,
};

use super::{ActionOutcome, ActionTransition, OutcomeData, RenderFlags};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetupError {
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: GamePhase },

    #[error("squad already submitted")]
    SquadAlreadySubmitted,

    #[error("squad not submitted yet")]
    SquadNotSubmitted,

    #[error("a confirmation is already pending")]
    ConfirmationPending,

    #[error("both squads, a map, and a mission are required first")]
    SetupIncomplete,

    #[error("only the initiative player chooses the deployment zone")]
    NotInitiativeHolder,

    #[error("figure {0} is not in your squad")]
    FigureNotInSquad(FigureKey),

    #[error("figure {0} is already placed")]
    FigureAlreadyPlaced(FigureKey),

    #[error("cell {0} is outside your deployment zone")]
    CellNotInZone(Position),

    #[error("cell {0} cannot hold this figure")]
    CellBlocked(Position),

    #[error("already marked deployed")]
    AlreadyDeployed,

    #[error("{0} figure(s) still undeployed")]
    FiguresUnplaced(usize),

    #[error("starting hand already drawn")]
    HandAlreadyDrawn,

    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Submits a squad and command deck. Over-budget submissions are held behind
/// a pending confirmation ("illegal deck override") instead of being
/// silently accepted or rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectSquadAction {
    pub side: Side,
    pub deployment: Vec<String>,
    pub command: Vec<String>,
    /// Unix seconds at the boundary, stamping any created confirmation.
    pub now: u64,
}

/// Builds the player's slots and deck from card data. Shared with the
/// illegal-deck confirmation path.
pub(crate) fn commit_squad(
    state: &mut GameState,
    env: &GameEnv<'_>,
    side: Side,
    deployment: &[String],
    command: &[String],
) -> Result<(), OracleError> {
    let cards = env.cards()?;
    let mut slots = Vec::new();
    for name in deployment {
        let card = cards.deployment_card_or_default(name);
        let group = slots
            .iter()
            .filter(|s: &&DeploymentSlot| s.dc_name == *name)
            .count() as u8;
        slots.push(DeploymentSlot::new(
            name.clone(),
            group,
            card.cost,
            card.sub_cost,
            card.figures as usize,
            card.health,
        ));
    }

    // Deterministic Fisher-Yates shuffle of the command deck.
    let mut deck: Vec<String> = command.to_vec();
    if let Ok(rng) = env.rng() {
        let base = compute_seed(state.game_seed, side.index() as u64, 0x5EED);
        for i in (1..deck.len()).rev() {
            let j = rng.next_u32(compute_seed(base, i as u64, 0)) as usize % (i + 1);
            deck.swap(i, j);
        }
    }

    let player = state.player_mut(side);
    player.squad = slots;
    player.deck = deck;
    player.hand.clear();
    player.discard.clear();
    player.squad_submitted = true;
    Ok(())
}

impl ActionTransition for SelectSquadAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Setup {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        if state.player(self.side).squad_submitted {
            return Err(SetupError::SquadAlreadySubmitted);
        }
        if state.pending_confirmation.is_some() {
            return Err(SetupError::ConfirmationPending);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let cards = env.cards()?;
        let squad_points: u32 = self
            .deployment
            .iter()
            .map(|name| cards.deployment_card_or_default(name).cost)
            .sum();
        let command_points: u32 = self
            .command
            .iter()
            .map(|name| cards.command_card(name).map(|c| c.cost).unwrap_or(0))
            .sum();

        let legal = squad_points <= GameConfig::SQUAD_POINT_LIMIT
            && command_points <= GameConfig::COMMAND_POINT_LIMIT
            && self.command.len() <= GameConfig::COMMAND_CARD_LIMIT;

        if !legal {
            state.pending_confirmation = Some(PendingConfirmation {
                side: self.side,
                kind: ConfirmKind::IllegalSquad {
                    deployment: self.deployment.clone(),
                    command: self.command.clone(),
                },
                created_at: self.now,
            });
            return Ok(ActionOutcome::log(
                format!(
                    "{} submitted an illegal list ({squad_points} squad / {command_points} command points)",
                    self.side
                ),
                RenderFlags::LOG,
            )
            .with_data(OutcomeData::Manual(
                "List is over the limit. Play anyway or resubmit?".to_string(),
            )));
        }

        commit_squad(state, env, self.side, &self.deployment, &self.command)?;
        Ok(ActionOutcome::log(
            format!("{} locked in a {squad_points}-point squad", self.side),
            RenderFlags::LOG,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectMapAction {
    pub side: Side,
    pub map_id: String,
}

impl ActionTransition for SelectMapAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Setup {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        state.selected_map = Some(self.map_id.clone());
        Ok(ActionOutcome::log(
            format!("Map set to {}", self.map_id),
            RenderFlags::LOG,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectMissionAction {
    pub side: Side,
    pub mission_id: String,
}

impl ActionTransition for SelectMissionAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Setup {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        state.selected_mission = Some(self.mission_id.clone());
        Ok(ActionOutcome::log(
            format!("Mission set to {}", self.mission_id),
            RenderFlags::LOG,
        ))
    }
}

/// Seeded coin flip for initiative once both squads, map, and mission are in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetermineInitiativeAction {
    pub side: Side,
}

impl ActionTransition for DetermineInitiativeAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::Setup {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        let ready = Side::ALL
            .into_iter()
            .all(|s| state.player(s).squad_submitted)
            && state.selected_map.is_some()
            && state.selected_mission.is_some();
        if !ready {
            return Err(SetupError::SetupIncomplete);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let rng = env.rng()?;
        let seed = compute_seed(state.game_seed, state.nonce, 0x1417);
        let winner = if rng.coin_flip(seed) {
            Side::Red
        } else {
            Side::Blue
        };
        state.initiative = winner;
        state.activation_turn = winner;
        state.phase = GamePhase::InitiativeDetermined;
        Ok(ActionOutcome::log(
            format!("{winner} wins initiative"),
            RenderFlags::LOG,
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChooseDeploymentZoneAction {
    pub side: Side,
    pub zone: DeploymentZone,
}

impl ActionTransition for ChooseDeploymentZoneAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.phase != GamePhase::InitiativeDetermined {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        if self.side != state.initiative {
            return Err(SetupError::NotInitiativeHolder);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        state.initiative_zone = Some(self.zone);
        seed_mission_tokens(state, env)?;
        state.phase = GamePhase::DeploymentZoneChosen;
        Ok(ActionOutcome::log(
            format!("{} deploys in zone {}", self.side, self.zone),
            RenderFlags::BOARD | RenderFlags::LOG,
        ))
    }
}

/// Places one figure into its deployment zone.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeployFigureAction {
    pub side: Side,
    pub figure: FigureKey,
    pub cell: Position,
    /// Required for rotatable footprints; defaults to horizontal.
    pub orientation: Option<Orientation>,
}

impl DeployFigureAction {
    fn deploying_side(state: &GameState) -> Option<Side> {
        match state.phase {
            GamePhase::DeploymentZoneChosen => Some(state.initiative),
            GamePhase::Deploying { side } => Some(side),
            _ => None,
        }
    }

    fn zone_of(state: &GameState, side: Side) -> Option<DeploymentZone> {
        let chosen = state.initiative_zone?;
        Some(if side == state.initiative {
            chosen
        } else {
            chosen.other()
        })
    }
}

impl ActionTransition for DeployFigureAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if Self::deploying_side(state) != Some(self.side) {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        if state.player(self.side).deployed {
            return Err(SetupError::AlreadyDeployed);
        }
        let slot = state
            .player(self.side)
            .slot(&self.figure)
            .ok_or_else(|| SetupError::FigureNotInSquad(self.figure.clone()))?;
        if slot.health(self.figure.figure).is_none() {
            return Err(SetupError::FigureNotInSquad(self.figure.clone()));
        }
        if state.board.is_placed(&self.figure) {
            return Err(SetupError::FigureAlreadyPlaced(self.figure.clone()));
        }

        let map = env.map()?;
        let zone = Self::zone_of(state, self.side).ok_or(SetupError::SetupIncomplete)?;
        let zone_cells = map.deployment_zone(zone);
        let card = env
            .cards()?
            .deployment_card_or_default(&self.figure.dc_name);
        let orientation = self.orientation.unwrap_or_default();
        for cell in card.footprint.cells(self.cell, orientation) {
            if !zone_cells.contains(&cell) {
                return Err(SetupError::CellNotInZone(cell));
            }
            if !map.contains(cell)
                || !map.terrain(cell).is_some_and(|t| t.is_traversable())
                || state.board.is_occupied(cell, None)
            {
                return Err(SetupError::CellBlocked(cell));
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let card = env
            .cards()?
            .deployment_card_or_default(&self.figure.dc_name);
        state.board.place(
            self.figure.clone(),
            self.side,
            card.footprint,
            self.orientation.unwrap_or_default(),
            self.cell,
        );
        state.undo_stack.push(UndoEntry::DeployPick {
            figure: self.figure.clone(),
        });
        Ok(ActionOutcome::log(
            format!("{} deployed at {}", self.figure, self.cell),
            RenderFlags::BOARD,
        ))
    }

    fn post_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.board.is_placed(&self.figure) {
            Ok(())
        } else {
            Err(SetupError::FigureNotInSquad(self.figure.clone()))
        }
    }
}

/// Locks a side's deployment. The second click is rejected, not re-applied.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkDeployedAction {
    pub side: Side,
}

impl ActionTransition for MarkDeployedAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if DeployFigureAction::deploying_side(state) != Some(self.side) {
            return Err(SetupError::WrongPhase { phase: state.phase });
        }
        if state.player(self.side).deployed {
            return Err(SetupError::AlreadyDeployed);
        }
        let unplaced = state
            .player(self.side)
            .squad
            .iter()
            .flat_map(|slot| slot.alive().map(|i| slot.figure_key(i)))
            .filter(|key| !state.board.is_placed(key))
            .count();
        if unplaced > 0 {
            return Err(SetupError::FiguresUnplaced(unplaced));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        state.player_mut(self.side).deployed = true;
        let mut outcome = ActionOutcome::log(
            format!("{} finished deploying", self.side),
            RenderFlags::BOARD | RenderFlags::LOG,
        );
        if self.side == state.initiative && !state.all_deployed() {
            state.phase = GamePhase::Deploying {
                side: self.side.opponent(),
            };
        } else if state.all_deployed() {
            outcome.log.extend(begin_first_round(state, env)?);
        }
        Ok(outcome)
    }
}

/// Draws the starting command hand, once.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawStartingHandAction {
    pub side: Side,
}

impl ActionTransition for DrawStartingHandAction {
    type Error = SetupError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if !state.player(self.side).squad_submitted {
            return Err(SetupError::SquadNotSubmitted);
        }
        if state.player(self.side).hand_drawn {
            return Err(SetupError::HandAlreadyDrawn);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let player = state.player_mut(self.side);
        let drawn = player.draw(GameConfig::STARTING_HAND);
        player.hand_drawn = true;
        Ok(ActionOutcome::log(
            format!("{} draws a starting hand of {drawn}", self.side),
            RenderFlags::HANDS,
        ))
    }
}
