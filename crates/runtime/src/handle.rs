//! Cloneable facade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides the channel plumbing and offers async helpers
//! for driving matches and streaming render events per topic.

use skirmish_core::{Action, ActionOutcome, GameState};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::worker::Command;

/// Client-facing handle to interact with the runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Creates a new match. `seed` pins the dice for reproducible games;
    /// `None` draws a random one.
    pub async fn create_game(
        &self,
        game_id: &str,
        red_user: &str,
        blue_user: &str,
        seed: Option<u64>,
    ) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Create {
                game_id: game_id.to_string(),
                red_user: red_user.to_string(),
                blue_user: blue_user.to_string(),
                seed,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Submits one structured action for a game and returns its outcome.
    pub async fn submit(&self, game_id: &str, action: Action) -> Result<ActionOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Act {
                game_id: game_id.to_string(),
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Read-only snapshot of a game record.
    pub async fn query(&self, game_id: &str) -> Result<GameState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Query {
                game_id: game_id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Subscribe to render events for one topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Asks the worker to stop after draining queued commands.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }
}
