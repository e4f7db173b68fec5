//! Action dispatch through the three-phase transition pipeline.

use crate::action::{Action, ActionOutcome, ActionTransition};
use crate::env::GameEnv;
use crate::state::GameState;

use super::errors::{ExecuteError, TransitionPhase, TransitionPhaseError};

/// Runs one transition through pre_validate → apply → post_validate.
fn drive<T>(
    transition: &T,
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<ActionOutcome, TransitionPhaseError<T::Error>>
where
    T: ActionTransition,
    T::Error: core::fmt::Display,
{
    transition
        .pre_validate(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    let outcome = transition
        .apply(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))?;

    Ok(outcome)
}

/// Routes a structured action to its transition. `Undo` and `KillGame` are
/// engine-level and handled before dispatch.
pub(super) fn execute_transition(
    action: &Action,
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<ActionOutcome, ExecuteError> {
    match action {
        Action::SelectSquad(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::SelectMap(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::SelectMission(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::DetermineInitiative(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::ChooseDeploymentZone(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::DeployFigure(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::MarkDeployed(a) => drive(a, state, env).map_err(ExecuteError::Setup),
        Action::DrawStartingHand(a) => drive(a, state, env).map_err(ExecuteError::Setup),

        Action::ActivateCard(a) => drive(a, state, env).map_err(ExecuteError::Activation),
        Action::EndTurn(a) => drive(a, state, env).map_err(ExecuteError::Activation),
        Action::EndActivationPhase(a) => drive(a, state, env).map_err(ExecuteError::Activation),
        Action::EndRoundWindow(a) => drive(a, state, env).map_err(ExecuteError::Activation),

        Action::MoveStart(a) => drive(a, state, env).map_err(ExecuteError::Move),
        Action::MoveDeclare(a) => drive(a, state, env).map_err(ExecuteError::Move),
        Action::MoveCommit(a) => drive(a, state, env).map_err(ExecuteError::Move),

        Action::AttackDeclare(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::PreCombatReady(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::RollAttackDice(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::RollDefenseDice(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::RerollDie(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::RerollDone(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::SpendSurge(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::SurgeDone(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::ResolveCombat(a) => drive(a, state, env).map_err(ExecuteError::Combat),
        Action::ChooseCleaveTarget(a) => drive(a, state, env).map_err(ExecuteError::Combat),

        Action::Interact(a) => drive(a, state, env).map_err(ExecuteError::Interact),
        Action::PlayCommandCard(a) => drive(a, state, env).map_err(ExecuteError::Command),
        Action::ConfirmPending(a) => drive(a, state, env).map_err(ExecuteError::Command),
        Action::CancelPending(a) => drive(a, state, env).map_err(ExecuteError::Command),

        Action::Undo { .. } | Action::KillGame { .. } => {
            unreachable!("engine-level actions are handled before dispatch")
        }
    }
}
