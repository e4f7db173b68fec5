//! The command worker: the single writer for all game records.
//!
//! Every external action funnels through one mpsc channel into this loop,
//! which executes it against the addressed game, persists the store, and
//! publishes render events. One command runs to completion before the next
//! starts, so handlers for the same game never interleave and persistence
//! writes are serialized.

use chrono::Utc;
use skirmish_core::{Action, ActionOutcome, GameEngine, GameState, RenderFlags};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};
use crate::events::{BoardSnapshot, CombatUpdate, Event, EventBus, LogLines};
use crate::oracle::{MapView, OracleManager};
use crate::store::GameStore;

/// Commands accepted by the worker.
pub enum Command {
    Create {
        game_id: String,
        red_user: String,
        blue_user: String,
        seed: Option<u64>,
        reply: oneshot::Sender<Result<()>>,
    },
    Act {
        game_id: String,
        action: Action,
        reply: oneshot::Sender<Result<ActionOutcome>>,
    },
    Query {
        game_id: String,
        reply: oneshot::Sender<Result<GameState>>,
    },
    Shutdown,
}

pub(crate) async fn run(
    mut store: GameStore,
    oracles: OracleManager,
    bus: EventBus,
    mut rx: mpsc::Receiver<Command>,
) {
    info!("command worker started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Create {
                game_id,
                red_user,
                blue_user,
                seed,
                reply,
            } => {
                let seed = seed.unwrap_or_else(rand::random);
                let result = store
                    .create(&game_id, &red_user, &blue_user, seed)
                    .and_then(|_| store.persist());
                if result.is_ok() {
                    info!(game_id, "game created");
                }
                let _ = reply.send(result);
            }

            Command::Act {
                game_id,
                action,
                reply,
            } => {
                let result = execute(&mut store, &oracles, &game_id, &action);
                match &result {
                    Ok(outcome) => {
                        // Persistence and presentation failures never roll
                        // back the committed mutation.
                        if let Err(e) = store.persist() {
                            warn!(game_id, "state change not persisted: {e}");
                        }
                        if let Ok(state) = store.get(&game_id) {
                            publish(&bus, state, outcome);
                        }
                    }
                    Err(e) => debug!(game_id, "action rejected: {e}"),
                }
                let _ = reply.send(result);
            }

            Command::Query { game_id, reply } => {
                let _ = reply.send(store.get(&game_id).cloned());
            }

            Command::Shutdown => break,
        }
    }
    info!("command worker stopped");
}

fn execute(
    store: &mut GameStore,
    oracles: &OracleManager,
    game_id: &str,
    action: &Action,
) -> Result<ActionOutcome> {
    let state = store.get_mut(game_id)?;
    let map_view = state
        .selected_map
        .as_deref()
        .and_then(|id| oracles.map_geometry(id))
        .map(MapView::new);
    let env = oracles.env(map_view.as_ref());
    let mut engine = GameEngine::new(state);
    engine.execute(&env, action).map_err(RuntimeError::from)
}

/// Publishes the minimal render data the outcome invalidated.
fn publish(bus: &EventBus, state: &GameState, outcome: &ActionOutcome) {
    if outcome.refresh.contains(RenderFlags::BOARD) {
        bus.publish(Event::Board(BoardSnapshot::from_state(state)));
    }
    if outcome.refresh.contains(RenderFlags::COMBAT) {
        bus.publish(Event::Combat(CombatUpdate {
            game_id: state.game_id.clone(),
            phase: state
                .pending_combat
                .as_ref()
                .map(|s| s.phase.to_string()),
            lines: outcome.log.clone(),
        }));
    }
    if !outcome.log.is_empty() {
        bus.publish(Event::Log(LogLines {
            game_id: state.game_id.clone(),
            at: Utc::now(),
            lines: outcome.log.clone(),
        }));
    }
}
