//! Command-card transitions: playing cards, and confirming or cancelling
//! pending resolutions (illegal-deck override, manual card resolution).

use crate::ability::{AbilityContext, AbilityError, AbilityOutcome, resolve_ability};
use crate::config::GameConfig;
use crate::env::{GameEnv, OracleError};
use crate::state::{
    ConfirmKind, FigureKey, GameState, PendingConfirmation, Position, Side, UndoEntry,
};

use super::setup::commit_squad;
use super::{ActionOutcome, ActionTransition, OutcomeData, RenderFlags};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandError {
    #[error("\"{0}\" is not in your hand")]
    CardNotInHand(String),

    #[error("resolve the pending confirmation first")]
    ConfirmationPending,

    #[error("nothing is waiting for confirmation")]
    NothingToConfirm,

    #[error("that confirmation belongs to the other player")]
    NotYourConfirmation,

    #[error("this card attaches to a deployment card; pick a target")]
    AttachTargetRequired,

    #[error("attach target {0} is not in your squad")]
    AttachTargetUnknown(FigureKey),

    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error("missing oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Plays a command card from hand. Depending on the card this applies the
/// effect, asks for a choice/space first, attaches to a deployment card, or
/// parks the card behind a manual-resolution confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayCommandCardAction {
    pub side: Side,
    pub card: String,
    /// Deployment-card figure to attach to, for attaching cards.
    pub attach_target: Option<FigureKey>,
    /// Figure the effect originates from, for ranged effects.
    pub source_figure: Option<FigureKey>,
    /// Player's pick after a `NeedsChoice` outcome.
    pub choice: Option<usize>,
    /// Player's pick after a `NeedsSpace` outcome.
    pub space: Option<Position>,
    /// Unix seconds at the boundary; stamps a created confirmation.
    pub now: u64,
}

impl ActionTransition for PlayCommandCardAction {
    type Error = CommandError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        if state.pending_confirmation.is_some() {
            return Err(CommandError::ConfirmationPending);
        }
        if !state.player(self.side).hand.iter().any(|c| *c == self.card) {
            return Err(CommandError::CardNotInHand(self.card.clone()));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let command_card = env.cards()?.command_card(&self.card);

        // Attaching cards bypass the resolver: the attachment itself is the
        // effect, tracked on the deployment slot.
        if command_card.as_ref().is_some_and(|c| c.attaches) {
            let target = self
                .attach_target
                .clone()
                .ok_or(CommandError::AttachTargetRequired)?;
            let side = self.side;
            let slot = state
                .player_mut(side)
                .slot_mut(&target)
                .ok_or_else(|| CommandError::AttachTargetUnknown(target.clone()))?;
            slot.attachments.push(self.card.clone());
            state.player_mut(side).take_from_hand(&self.card);
            state.undo_stack.push(UndoEntry::CcPlayDc {
                side,
                card: self.card.clone(),
                target: target.clone(),
            });
            return Ok(ActionOutcome::log(
                format!("{} attaches {} to {}", self.side, self.card, target.dc_name),
                RenderFlags::HANDS | RenderFlags::LOG,
            ));
        }

        let ability_id = command_card
            .map(|c| c.ability)
            .unwrap_or_else(|| self.card.clone());
        let ctx = AbilityContext {
            side: self.side,
            source_figure: self.source_figure.clone(),
            chosen_option: self.choice,
            chosen_space: self.space,
        };

        match resolve_ability(state, env, &ability_id, &ctx)? {
            AbilityOutcome::Applied(applied) => {
                let card = state
                    .player_mut(self.side)
                    .take_from_hand(&self.card)
                    .ok_or_else(|| CommandError::CardNotInHand(self.card.clone()))?;
                state.player_mut(self.side).discard.push(card);
                state.undo_stack.push(UndoEntry::CcPlay {
                    side: self.side,
                    card: self.card.clone(),
                });
                let mut log = vec![format!("{} plays {}", self.side, self.card)];
                log.extend(applied.log);
                Ok(ActionOutcome {
                    log,
                    refresh: applied.refresh | RenderFlags::HANDS,
                    data: OutcomeData::None,
                })
            }
            AbilityOutcome::NeedsChoice { options } => Ok(ActionOutcome::log(
                format!("{} needs a target", self.card),
                RenderFlags::empty(),
            )
            .with_data(OutcomeData::Options(options))),
            AbilityOutcome::NeedsSpace { spaces } => Ok(ActionOutcome::log(
                format!("{} needs a space", self.card),
                RenderFlags::empty(),
            )
            .with_data(OutcomeData::Spaces(spaces))),
            AbilityOutcome::Manual { message } => {
                // The card leaves the hand but is not committed until the
                // player confirms; cancel restores it.
                state.player_mut(self.side).take_from_hand(&self.card);
                state.pending_confirmation = Some(PendingConfirmation {
                    side: self.side,
                    kind: ConfirmKind::ManualCard {
                        card: self.card.clone(),
                    },
                    created_at: self.now,
                });
                Ok(ActionOutcome::log(
                    format!("{}: {message}", self.card),
                    RenderFlags::HANDS,
                )
                .with_data(OutcomeData::Manual(message)))
            }
        }
    }
}

fn take_pending(
    state: &mut GameState,
    side: Side,
) -> Result<PendingConfirmation, CommandError> {
    let pending = state
        .pending_confirmation
        .as_ref()
        .ok_or(CommandError::NothingToConfirm)?;
    if pending.side != side {
        return Err(CommandError::NotYourConfirmation);
    }
    Ok(state
        .pending_confirmation
        .take()
        .ok_or(CommandError::NothingToConfirm)?)
}

/// Restores whatever a confirmation was holding in limbo.
fn restore_pending(state: &mut GameState, pending: &PendingConfirmation) {
    if let ConfirmKind::ManualCard { card } = &pending.kind {
        state.player_mut(pending.side).hand.push(card.clone());
    }
}

/// Commits a pending confirmation: "play anyway" for a manual card, or the
/// illegal-deck override. Expired confirmations are rolled back instead of
/// silently honored.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmPendingAction {
    pub side: Side,
    pub now: u64,
}

impl ActionTransition for ConfirmPendingAction {
    type Error = CommandError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let pending = state
            .pending_confirmation
            .as_ref()
            .ok_or(CommandError::NothingToConfirm)?;
        if pending.side != self.side {
            return Err(CommandError::NotYourConfirmation);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let pending = take_pending(state, self.side)?;

        if self.now.saturating_sub(pending.created_at) > GameConfig::CONFIRMATION_TTL_SECS {
            restore_pending(state, &pending);
            return Ok(ActionOutcome::log(
                "Confirmation expired; the action must be re-initiated",
                RenderFlags::HANDS | RenderFlags::LOG,
            ));
        }

        match pending.kind {
            ConfirmKind::IllegalSquad {
                deployment,
                command,
            } => {
                commit_squad(state, env, self.side, &deployment, &command)?;
                Ok(ActionOutcome::log(
                    format!("{} plays with an over-limit list", self.side),
                    RenderFlags::LOG,
                ))
            }
            ConfirmKind::ManualCard { card } => {
                state.player_mut(self.side).discard.push(card.clone());
                state.undo_stack.push(UndoEntry::CcPlay {
                    side: self.side,
                    card: card.clone(),
                });
                Ok(ActionOutcome::log(
                    format!("{card} is played; resolve its text manually"),
                    RenderFlags::HANDS | RenderFlags::LOG,
                ))
            }
        }
    }
}

/// Cancels a pending confirmation: "unplay" the card or withdraw the
/// over-limit list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CancelPendingAction {
    pub side: Side,
}

impl ActionTransition for CancelPendingAction {
    type Error = CommandError;

    fn side(&self) -> Side {
        self.side
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let pending = state
            .pending_confirmation
            .as_ref()
            .ok_or(CommandError::NothingToConfirm)?;
        if pending.side != self.side {
            return Err(CommandError::NotYourConfirmation);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<ActionOutcome, Self::Error> {
        let pending = take_pending(state, self.side)?;
        restore_pending(state, &pending);
        let message = match pending.kind {
            ConfirmKind::IllegalSquad { .. } => format!("{} withdraws the list", self.side),
            ConfirmKind::ManualCard { card } => format!("{card} returns to hand"),
        };
        Ok(ActionOutcome::log(message, RenderFlags::HANDS | RenderFlags::LOG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{AbilityDef, AbilityEffect, CardOracle, CommandCard, DeploymentCard};

    struct Cards;

    impl CardOracle for Cards {
        fn deployment_card(&self, _name: &str) -> Option<DeploymentCard> {
            None
        }

        fn command_card(&self, name: &str) -> Option<CommandCard> {
            match name {
                "Planning" => Some(CommandCard {
                    name: name.into(),
                    cost: 1,
                    ability: "draw-2".into(),
                    attaches: false,
                }),
                "Opportunist" => Some(CommandCard {
                    name: name.into(),
                    cost: 2,
                    ability: "opportunist".into(),
                    attaches: true,
                }),
                _ => None,
            }
        }

        fn ability(&self, id: &str) -> Option<AbilityDef> {
            (id == "draw-2").then(|| AbilityDef {
                id: id.into(),
                effect: AbilityEffect::Draw { count: 2 },
            })
        }
    }

    fn hand_state() -> GameState {
        let mut state = GameState::new("g", "a", "b", 1);
        let player = state.player_mut(Side::Red);
        player.hand = vec!["Planning".into(), "Mysterious Rite".into(), "Opportunist".into()];
        player.deck = vec!["cc1".into(), "cc2".into(), "cc3".into()];
        state
    }

    fn play(card: &str) -> PlayCommandCardAction {
        PlayCommandCardAction {
            side: Side::Red,
            card: card.into(),
            attach_target: None,
            source_figure: None,
            choice: None,
            space: None,
            now: 1_000,
        }
    }

    #[test]
    fn applied_card_moves_to_discard_with_undo() {
        let mut state = hand_state();
        let cards = Cards;
        let env = GameEnv::new(Some(&cards), None, None, None);
        let action = play("Planning");
        action.pre_validate(&state, &env).unwrap();
        action.apply(&mut state, &env).unwrap();
        assert_eq!(state.player(Side::Red).hand.len(), 4); // -1 played, +2 drawn
        assert_eq!(state.player(Side::Red).discard, vec!["Planning".to_string()]);
        assert!(matches!(
            state.undo_stack.last(),
            Some(UndoEntry::CcPlay { .. })
        ));
    }

    #[test]
    fn unknown_card_goes_to_manual_confirmation() {
        let mut state = hand_state();
        let cards = Cards;
        let env = GameEnv::new(Some(&cards), None, None, None);
        let action = play("Mysterious Rite");
        let outcome = action.apply(&mut state, &env).unwrap();
        assert!(matches!(outcome.data, OutcomeData::Manual(_)));
        assert!(state.pending_confirmation.is_some());
        // Card is in limbo, not in hand or discard.
        assert!(!state.player(Side::Red).hand.iter().any(|c| c == "Mysterious Rite"));
        assert!(state.player(Side::Red).discard.is_empty());
    }

    #[test]
    fn cancel_returns_the_card_confirm_commits_it() {
        let mut state = hand_state();
        let cards = Cards;
        let env = GameEnv::new(Some(&cards), None, None, None);
        play("Mysterious Rite").apply(&mut state, &env).unwrap();

        CancelPendingAction { side: Side::Red }
            .apply(&mut state, &env)
            .unwrap();
        assert!(state.player(Side::Red).hand.iter().any(|c| c == "Mysterious Rite"));
        assert!(state.pending_confirmation.is_none());

        play("Mysterious Rite").apply(&mut state, &env).unwrap();
        ConfirmPendingAction {
            side: Side::Red,
            now: 1_100,
        }
        .apply(&mut state, &env)
        .unwrap();
        assert_eq!(
            state.player(Side::Red).discard,
            vec!["Mysterious Rite".to_string()]
        );
    }

    #[test]
    fn expired_confirmation_is_rolled_back() {
        let mut state = hand_state();
        let cards = Cards;
        let env = GameEnv::new(Some(&cards), None, None, None);
        play("Mysterious Rite").apply(&mut state, &env).unwrap();

        ConfirmPendingAction {
            side: Side::Red,
            now: 1_000 + GameConfig::CONFIRMATION_TTL_SECS + 1,
        }
        .apply(&mut state, &env)
        .unwrap();
        // Not silently honored: the card went back to hand.
        assert!(state.player(Side::Red).hand.iter().any(|c| c == "Mysterious Rite"));
        assert!(state.player(Side::Red).discard.is_empty());
        assert!(state.pending_confirmation.is_none());
    }

    #[test]
    fn attaching_card_requires_and_records_target() {
        let mut state = hand_state();
        state
            .player_mut(Side::Red)
            .squad
            .push(crate::state::DeploymentSlot::new("Vader", 0, 18, None, 1, 16));
        let cards = Cards;
        let env = GameEnv::new(Some(&cards), None, None, None);

        let mut action = play("Opportunist");
        assert!(matches!(
            action.apply(&mut state, &env),
            Err(CommandError::AttachTargetRequired)
        ));

        action.attach_target = Some(FigureKey::new("Vader", 0, 0));
        action.apply(&mut state, &env).unwrap();
        assert_eq!(
            state.player(Side::Red).squad[0].attachments,
            vec!["Opportunist".to_string()]
        );
        assert!(matches!(
            state.undo_stack.last(),
            Some(UndoEntry::CcPlayDc { .. })
        ));
    }
}
