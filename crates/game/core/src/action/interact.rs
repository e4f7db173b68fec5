//! Interact transitions: doors and mission tokens.

use crate::env::{GameEnv, OracleError};
use crate::round::GamePhase;
use crate::state::{FigureKey, GameState, InteractUndo, Side, UndoEntry};

use super::{ActionOutcome, ActionTransition, RenderFlags};

/// What the figure is interacting with.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractOption {
    /// Open an adjacent closed door.
    OpenDoor { id: u16 },
    /// Pick up a token on or next to the figure.
    PickUpToken,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractError {
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: GamePhase },

    #[error("it is not your activation turn")]
    NotYourTurn,

    #[error("figure {0} is not part of the current activation")]
    NotInActivation(FigureKey),

    #[error("figure {0} has no actions left")]
    NoActionsLeft(FigureKey),

    #[error("door {0} does not exist")]
    UnknownDoor(u16),

    #[error("door {0} is already open")]
    DoorAlreadyOpen(u16),

    #[error("door {0} is not adjacent to the figure")]
    DoorNotAdjacent(u16),

    #[error("no token within reach")]
    NoTokenInReach,

    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractAction {
    pub side: Side,
    pub figure: FigureKey,
    pub option: InteractOption,
}

impl InteractAction {
    fn validate_actor(&self, state: &GameState) -> Result<(), InteractError> {
        if state.phase != GamePhase::Activation {
            return Err(InteractError::WrongPhase { phase: state.phase });
        }
        if state.activation_turn != self.side {
            return Err(InteractError::NotYourTurn);
        }
        let Some(active) = state.current_activation.as_ref() else {
            return Err(InteractError::NotInActivation(self.figure.clone()));
        };
        if active.side != self.side || !active.contains(&self.figure) {
            return Err(InteractError::NotInActivation(self.figure.clone()));
        }
        if active.actions_of(&self.figure) == 0 {
            return Err(InteractError::NoActionsLeft(self.figure.clone()));
        }
        Ok(())
    }

    /// The token index reachable by the figure, if any: on a footprint cell
    /// or adjacent to one.
    fn token_in_reach(&self, state: &GameState) -> Option<usize> {
        let cells = state.board.cells_of(&self.figure);
        state.board.tokens.iter().enumerate().find_map(|(i, token)| {
            let pos = token.position.filter(|_| token.carried_by.is_none())?;
            cells
                .iter()
                .any(|c| *c == pos || c.is_adjacent(pos))
                .then_some(i)
        })
    }
}

impl ActionTransition for InteractAction {
    type Error = InteractError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        self.validate_actor(state)?;
        match &self.option {
            InteractOption::OpenDoor { id } => {
                let door = env
                    .map()?
                    .doors()
                    .into_iter()
                    .find(|d| d.id == *id)
                    .ok_or(InteractError::UnknownDoor(*id))?;
                if state.board.open_doors.contains(id) {
                    return Err(InteractError::DoorAlreadyOpen(*id));
                }
                let cells = state.board.cells_of(&self.figure);
                let adjacent = door
                    .cells
                    .iter()
                    .any(|dc| cells.iter().any(|fc| fc.is_adjacent(*dc)));
                if !adjacent {
                    return Err(InteractError::DoorNotAdjacent(*id));
                }
            }
            InteractOption::PickUpToken => {
                if self.token_in_reach(state).is_none() {
                    return Err(InteractError::NoTokenInReach);
                }
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        if let Some(active) = state.current_activation.as_mut() {
            active.spend_action(&self.figure);
        }

        let (effect, message) = match &self.option {
            InteractOption::OpenDoor { id } => {
                state.board.open_doors.insert(*id);
                (
                    InteractUndo::DoorOpened(*id),
                    format!("{} opens door {id}", self.figure),
                )
            }
            InteractOption::PickUpToken => {
                let index = self
                    .token_in_reach(state)
                    .ok_or(InteractError::NoTokenInReach)?;
                let token = &mut state.board.tokens[index];
                let position = token.position.take().ok_or(InteractError::NoTokenInReach)?;
                token.carried_by = Some(self.figure.clone());
                let kind = token.kind;
                (
                    InteractUndo::TokenPicked { index, position },
                    format!("{} picks up a {kind} token", self.figure),
                )
            }
        };

        state.undo_stack.push(UndoEntry::Interact {
            figure: self.figure.clone(),
            effect,
            restore_action: true,
        });
        Ok(ActionOutcome::log(
            message,
            RenderFlags::BOARD | RenderFlags::LOG,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{DeploymentZone, Door, MapDimensions, MapOracle, TerrainKind};
    use crate::state::{
        ActiveGroup, DeploymentSlot, Footprint, Orientation, Position, TokenKind, TokenState,
    };

    struct DoorMap;

    impl MapOracle for DoorMap {
        fn dimensions(&self) -> MapDimensions {
            MapDimensions::new(5, 5)
        }

        fn terrain(&self, position: Position) -> Option<TerrainKind> {
            self.dimensions().contains(position).then_some(TerrainKind::Open)
        }

        fn doors(&self) -> Vec<Door> {
            vec![Door {
                id: 1,
                cells: vec![Position::new(2, 2)],
            }]
        }

        fn deployment_zone(&self, _zone: DeploymentZone) -> Vec<Position> {
            Vec::new()
        }
    }

    fn interact_state(at: Position) -> GameState {
        let mut state = GameState::new("g", "a", "b", 1);
        state
            .player_mut(Side::Red)
            .squad
            .push(DeploymentSlot::new("Scout", 0, 3, None, 1, 3));
        let key = FigureKey::new("Scout", 0, 0);
        state.board.place(
            key.clone(),
            Side::Red,
            Footprint::Single,
            Orientation::Horizontal,
            at,
        );
        state.phase = GamePhase::Activation;
        state.activation_turn = Side::Red;
        state.current_activation = Some(ActiveGroup {
            side: Side::Red,
            dc_name: "Scout".into(),
            group: 0,
            actions: [(key, 2)].into_iter().collect(),
        });
        state
    }

    #[test]
    fn door_opens_and_is_undoable_data() {
        let mut state = interact_state(Position::new(1, 2));
        let map = DoorMap;
        let env = GameEnv::new(None, Some(&map), None, None);
        let action = InteractAction {
            side: Side::Red,
            figure: FigureKey::new("Scout", 0, 0),
            option: InteractOption::OpenDoor { id: 1 },
        };
        action.pre_validate(&state, &env).unwrap();
        action.apply(&mut state, &env).unwrap();
        assert!(state.board.open_doors.contains(&1));
        assert!(matches!(
            state.undo_stack.last(),
            Some(UndoEntry::Interact {
                effect: InteractUndo::DoorOpened(1),
                ..
            })
        ));
        // Second open attempt is rejected.
        assert_eq!(
            action.pre_validate(&state, &env),
            Err(InteractError::DoorAlreadyOpen(1))
        );
    }

    #[test]
    fn distant_door_is_rejected() {
        let state = interact_state(Position::new(0, 0));
        let map = DoorMap;
        let env = GameEnv::new(None, Some(&map), None, None);
        let action = InteractAction {
            side: Side::Red,
            figure: FigureKey::new("Scout", 0, 0),
            option: InteractOption::OpenDoor { id: 1 },
        };
        assert_eq!(
            action.pre_validate(&state, &env),
            Err(InteractError::DoorNotAdjacent(1))
        );
    }

    #[test]
    fn token_pickup_consumes_an_action() {
        let mut state = interact_state(Position::new(1, 1));
        state
            .board
            .tokens
            .push(TokenState::on_cell(TokenKind::Crate, Position::new(1, 2)));
        let map = DoorMap;
        let env = GameEnv::new(None, Some(&map), None, None);
        let action = InteractAction {
            side: Side::Red,
            figure: FigureKey::new("Scout", 0, 0),
            option: InteractOption::PickUpToken,
        };
        action.pre_validate(&state, &env).unwrap();
        action.apply(&mut state, &env).unwrap();
        assert_eq!(
            state.board.tokens[0].carried_by,
            Some(FigureKey::new("Scout", 0, 0))
        );
        let active = state.current_activation.as_ref().unwrap();
        assert_eq!(active.actions_of(&FigureKey::new("Scout", 0, 0)), 1);
    }
}
