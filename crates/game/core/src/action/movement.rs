//! Movement transitions: gaining movement points, committing a distance,
//! and committing a destination at exactly that cost.

use crate::env::{GameEnv, OracleError};
use crate::movement::{
    MoveSession, MovementProfile, compute_reachable, displacement_cell, reconstruct_path,
};
use crate::round::GamePhase;
use crate::state::{FigureKey, GameState, Position, Side, UndoEntry};

use super::{ActionOutcome, ActionTransition, OutcomeData, RenderFlags};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveError {
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: GamePhase },

    #[error("it is not your activation turn")]
    NotYourTurn,

    #[error("figure {0} is not part of the current activation")]
    NotInActivation(FigureKey),

    #[error("figure {0} has no actions left")]
    NoActionsLeft(FigureKey),

    #[error("figure {0} is not on the board")]
    NotOnBoard(FigureKey),

    #[error("no movement in progress for {0}")]
    NoSession(FigureKey),

    #[error("requested {requested} movement points, only {available} banked")]
    NotEnoughPoints { requested: u8, available: u8 },

    #[error("no valid movement spaces")]
    NoValidSpaces,

    #[error("no distance committed yet")]
    NoDistanceCommitted,

    #[error("{0} is not reachable at the committed cost")]
    InvalidDestination(Position),

    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Common guards for the movement flow: phase, turn holder, membership in
/// the current activation.
fn validate_mover(state: &GameState, side: Side, figure: &FigureKey) -> Result<(), MoveError> {
    if state.phase != GamePhase::Activation {
        return Err(MoveError::WrongPhase { phase: state.phase });
    }
    if state.activation_turn != side {
        return Err(MoveError::NotYourTurn);
    }
    let Some(active) = state.current_activation.as_ref() else {
        return Err(MoveError::NotInActivation(figure.clone()));
    };
    if active.side != side || !active.contains(figure) {
        return Err(MoveError::NotInActivation(figure.clone()));
    }
    if !state.board.is_placed(figure) {
        return Err(MoveError::NotOnBoard(figure.clone()));
    }
    Ok(())
}

/// Movement profile of a figure, from its card and board placement.
pub(crate) fn profile_of(
    state: &GameState,
    env: &GameEnv<'_>,
    figure: &FigureKey,
) -> Result<(MovementProfile, u8), OracleError> {
    let card = env.cards()?.deployment_card_or_default(&figure.dc_name);
    Ok((
        MovementProfile {
            footprint: state.board.footprint_of(figure),
            orientation: state.board.orientation_of(figure),
            mobile: card.mobile,
            massive: card.footprint.is_massive(),
        },
        card.speed,
    ))
}

/// Spends one action to gain the figure's speed in movement points. Points
/// bank across multiple Move actions within the same activation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveStartAction {
    pub side: Side,
    pub figure: FigureKey,
}

impl ActionTransition for MoveStartAction {
    type Error = MoveError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        validate_mover(state, self.side, &self.figure)?;
        let Some(active) = state.current_activation.as_ref() else {
            return Err(MoveError::NotInActivation(self.figure.clone()));
        };
        if active.actions_of(&self.figure) == 0 {
            return Err(MoveError::NoActionsLeft(self.figure.clone()));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let (_, speed) = profile_of(state, env, &self.figure)?;
        if let Some(active) = state.current_activation.as_mut() {
            active.spend_action(&self.figure);
        }
        let session = state
            .moves_in_progress
            .entry(self.figure.clone())
            .or_insert_with(|| MoveSession::new(self.figure.clone()));
        session.add_points(speed);
        let banked = session.mp;
        Ok(ActionOutcome::log(
            format!("{} gains {speed} movement points ({banked} banked)", self.figure),
            RenderFlags::LOG,
        ))
    }
}

/// Commits a distance. The outcome lists every cell reachable at exactly
/// that cost; the player then picks one with [`MoveCommitAction`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveDeclareAction {
    pub side: Side,
    pub figure: FigureKey,
    pub distance: u8,
}

impl ActionTransition for MoveDeclareAction {
    type Error = MoveError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        validate_mover(state, self.side, &self.figure)?;
        let session = state
            .moves_in_progress
            .get(&self.figure)
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;
        if self.distance == 0 || self.distance > session.mp {
            return Err(MoveError::NotEnoughPoints {
                requested: self.distance,
                available: session.mp,
            });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let (profile, _) = profile_of(state, env, &self.figure)?;
        let start = state
            .board
            .position_of(&self.figure)
            .ok_or_else(|| MoveError::NotOnBoard(self.figure.clone()))?;

        // Recompute the reachability cache when the banked budget grew or
        // the figure moved since it was built.
        let stale = !state
            .moves_in_progress
            .get(&self.figure)
            .map(|s| s.cache_is_fresh(start, &profile))
            .unwrap_or(false);
        if stale {
            let budget = state
                .moves_in_progress
                .get(&self.figure)
                .map(|s| s.mp)
                .unwrap_or(0);
            let cache =
                compute_reachable(&state.board, env.map()?, &self.figure, start, budget, &profile);
            if let Some(session) = state.moves_in_progress.get_mut(&self.figure) {
                session.cache = Some(cache);
            }
        }

        let session = state
            .moves_in_progress
            .get_mut(&self.figure)
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;
        let spaces = session
            .cache
            .as_ref()
            .map(|c| c.destinations_at(self.distance))
            .unwrap_or_default();
        if spaces.is_empty() {
            // Reportable, non-fatal: nothing is mutated, the player picks a
            // different distance.
            return Err(MoveError::NoValidSpaces);
        }
        session.pending_distance = Some(self.distance);
        Ok(ActionOutcome::log(
            format!(
                "{} commits {} movement point(s); {} space(s) available",
                self.figure,
                self.distance,
                spaces.len()
            ),
            RenderFlags::BOARD,
        )
        .with_data(OutcomeData::Spaces(spaces)))
    }
}

/// Commits the destination for the previously declared distance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveCommitAction {
    pub side: Side,
    pub figure: FigureKey,
    pub destination: Position,
}

impl ActionTransition for MoveCommitAction {
    type Error = MoveError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        validate_mover(state, self.side, &self.figure)?;
        let session = state
            .moves_in_progress
            .get(&self.figure)
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;
        let distance = session
            .pending_distance
            .ok_or(MoveError::NoDistanceCommitted)?;
        let reachable = session
            .cache
            .as_ref()
            .is_some_and(|c| c.cost_of(self.destination) == Some(distance));
        if !reachable {
            return Err(MoveError::InvalidDestination(self.destination));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let session = state
            .moves_in_progress
            .get(&self.figure)
            .cloned()
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;
        let distance = session
            .pending_distance
            .ok_or(MoveError::NoDistanceCommitted)?;
        let cache = session
            .cache
            .as_ref()
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;

        let from = state
            .board
            .position_of(&self.figure)
            .ok_or_else(|| MoveError::NotOnBoard(self.figure.clone()))?;
        let path = reconstruct_path(cache, self.destination)
            .ok_or(MoveError::InvalidDestination(self.destination))?;

        // Massive arrival: push a covered smaller figure aside first.
        let (profile, _) = profile_of(state, env, &self.figure)?;
        let mut displaced = None;
        if profile.massive {
            let arrival_cells = profile
                .footprint
                .cells(self.destination, profile.orientation);
            let occupant = arrival_cells
                .iter()
                .find_map(|cell| state.board.occupant_at(*cell).cloned())
                .filter(|o| *o != self.figure);
            if let Some(occupant) = occupant {
                let push = displacement_cell(
                    &state.board,
                    env.map()?,
                    &self.figure,
                    &occupant,
                    self.destination,
                    &profile,
                )
                .ok_or(MoveError::InvalidDestination(self.destination))?;
                let prior = state
                    .board
                    .move_to(&occupant, push)
                    .ok_or_else(|| MoveError::NotOnBoard(occupant.clone()))?;
                displaced = Some((occupant, prior));
            }
        }

        state.undo_stack.push(UndoEntry::Move {
            figure: self.figure.clone(),
            from,
            session_before: session,
            displaced: displaced.clone(),
        });

        state.board.move_to(&self.figure, self.destination);
        let live = state
            .moves_in_progress
            .get_mut(&self.figure)
            .ok_or_else(|| MoveError::NoSession(self.figure.clone()))?;
        live.mp -= distance;
        live.pending_distance = None;
        live.cache = None;
        let remaining = live.mp;
        if remaining == 0 {
            state.moves_in_progress.remove(&self.figure);
        }

        let steps: Vec<String> = path.iter().map(Position::to_string).collect();
        let mut outcome = ActionOutcome::log(
            format!(
                "{} moves to {} ({} MP left): {}",
                self.figure,
                self.destination,
                remaining,
                steps.join(" ")
            ),
            RenderFlags::BOARD | RenderFlags::LOG,
        );
        if let Some((pushed, _)) = displaced {
            outcome.log.push(format!("{pushed} is pushed aside"));
        }
        Ok(outcome)
    }

    fn post_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.board.position_of(&self.figure) == Some(self.destination) {
            Ok(())
        } else {
            Err(MoveError::NotOnBoard(self.figure.clone()))
        }
    }
}
