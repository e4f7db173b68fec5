//! Structured action surface.
//!
//! Every external request reaches the engine as one tagged [`Action`]
//! variant, parsed and validated once at the boundary. Each variant wraps a
//! transition struct implementing [`ActionTransition`]; the engine drives
//! the three-phase pipeline (pre_validate → apply → post_validate) and per-
//! action error enums report exactly why a request was rejected.

pub mod activation;
pub mod combat;
pub mod command;
pub mod interact;
pub mod movement;
pub mod setup;

pub use activation::{
    ActivateCardAction, ActivationError, EndActivationPhaseAction, EndRoundWindowAction,
    EndTurnAction,
};
pub use combat::{
    AttackDeclareAction, CleaveTargetAction, PreCombatReadyAction, RerollDieAction,
    RerollDoneAction, ResolveCombatAction, RollAttackAction, RollDefenseAction, SpendSurgeAction,
    SurgeDoneAction,
};
pub use command::{
    CancelPendingAction, CommandError, ConfirmPendingAction, PlayCommandCardAction,
};
pub use interact::{InteractAction, InteractError, InteractOption};
pub use movement::{MoveCommitAction, MoveDeclareAction, MoveError, MoveStartAction};
pub use setup::{
    ChooseDeploymentZoneAction, DeployFigureAction, DetermineInitiativeAction,
    DrawStartingHandAction, MarkDeployedAction, SelectMapAction, SelectMissionAction,
    SelectSquadAction, SetupError,
};

use crate::env::GameEnv;
use crate::state::{FigureKey, GameState, Position, Side};

bitflags::bitflags! {
    /// Which presentation surfaces an outcome invalidated. The transport
    /// layer re-renders only what changed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RenderFlags: u8 {
        const BOARD  = 1 << 0;
        const HANDS  = 1 << 1;
        const COMBAT = 1 << 2;
        const LOG    = 1 << 3;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Structured data riding along with an outcome, for flows that need the
/// player to pick something next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutcomeData {
    #[default]
    None,
    /// Legal destination cells (exact-cost movement, token placement).
    Spaces(Vec<Position>),
    /// Labeled options to choose from (ability targets).
    Options(Vec<String>),
    /// Cleave targets awaiting a choice.
    CleaveTargets(Vec<FigureKey>),
    /// Manual-resolution prompt: offer "play anyway" / "unplay".
    Manual(String),
}

/// Result of a successfully executed action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub log: Vec<String>,
    pub refresh: RenderFlags,
    pub data: OutcomeData,
}

impl ActionOutcome {
    pub fn log(message: impl Into<String>, refresh: RenderFlags) -> Self {
        Self {
            log: vec![message.into()],
            refresh,
            data: OutcomeData::None,
        }
    }

    pub fn with_data(mut self, data: OutcomeData) -> Self {
        self.data = data;
        self
    }
}

/// Defines how a concrete action variant mutates game state.
///
/// Implementors surface pre- and post-conditions around the mutation. All
/// hooks receive read-only oracle access via [`GameEnv`]; `pre_validate`
/// must not mutate, so a rejected request leaves the record untouched.
pub trait ActionTransition {
    type Error;

    /// The seat issuing this action.
    fn side(&self) -> Side;

    /// Validates pre-conditions against the state **before** mutation.
    fn pre_validate(&self, _state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies the action, mutating the game state directly. Implementations
    /// may assume `pre_validate` succeeded.
    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>)
    -> Result<ActionOutcome, Self::Error>;

    /// Validates post-conditions against the state **after** mutation.
    fn post_validate(&self, _state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Top-level tagged action request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    // Setup flow
    SelectSquad(SelectSquadAction),
    SelectMap(SelectMapAction),
    SelectMission(SelectMissionAction),
    DetermineInitiative(DetermineInitiativeAction),
    ChooseDeploymentZone(ChooseDeploymentZoneAction),
    DeployFigure(DeployFigureAction),
    MarkDeployed(MarkDeployedAction),
    DrawStartingHand(DrawStartingHandAction),

    // Activation flow
    ActivateCard(ActivateCardAction),
    EndTurn(EndTurnAction),
    EndActivationPhase(EndActivationPhaseAction),
    EndRoundWindow(EndRoundWindowAction),

    // Movement
    MoveStart(MoveStartAction),
    MoveDeclare(MoveDeclareAction),
    MoveCommit(MoveCommitAction),

    // Combat
    AttackDeclare(AttackDeclareAction),
    PreCombatReady(PreCombatReadyAction),
    RollAttackDice(RollAttackAction),
    RollDefenseDice(RollDefenseAction),
    RerollDie(RerollDieAction),
    RerollDone(RerollDoneAction),
    SpendSurge(SpendSurgeAction),
    SurgeDone(SurgeDoneAction),
    ResolveCombat(ResolveCombatAction),
    ChooseCleaveTarget(CleaveTargetAction),

    // Board interaction and cards
    Interact(InteractAction),
    PlayCommandCard(PlayCommandCardAction),
    ConfirmPending(ConfirmPendingAction),
    CancelPending(CancelPendingAction),

    // Engine-level
    Undo { side: Side },
    KillGame { side: Side },
}

impl Action {
    /// The seat issuing the action.
    pub fn side(&self) -> Side {
        match self {
            Action::SelectSquad(a) => a.side,
            Action::SelectMap(a) => a.side,
            Action::SelectMission(a) => a.side,
            Action::DetermineInitiative(a) => a.side,
            Action::ChooseDeploymentZone(a) => a.side,
            Action::DeployFigure(a) => a.side,
            Action::MarkDeployed(a) => a.side,
            Action::DrawStartingHand(a) => a.side,
            Action::ActivateCard(a) => a.side,
            Action::EndTurn(a) => a.side,
            Action::EndActivationPhase(a) => a.side,
            Action::EndRoundWindow(a) => a.side,
            Action::MoveStart(a) => a.side,
            Action::MoveDeclare(a) => a.side,
            Action::MoveCommit(a) => a.side,
            Action::AttackDeclare(a) => a.side,
            Action::PreCombatReady(a) => a.side,
            Action::RollAttackDice(a) => a.side,
            Action::RollDefenseDice(a) => a.side,
            Action::RerollDie(a) => a.side,
            Action::RerollDone(a) => a.side,
            Action::SpendSurge(a) => a.side,
            Action::SurgeDone(a) => a.side,
            Action::ResolveCombat(a) => a.side,
            Action::ChooseCleaveTarget(a) => a.side,
            Action::Interact(a) => a.side,
            Action::PlayCommandCard(a) => a.side,
            Action::ConfirmPending(a) => a.side,
            Action::CancelPending(a) => a.side,
            Action::Undo { side } => *side,
            Action::KillGame { side } => *side,
        }
    }
}
