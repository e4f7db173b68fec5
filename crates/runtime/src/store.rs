//! In-process store of all match records.

use std::collections::BTreeMap;
use std::sync::Arc;

use skirmish_core::GameState;
use tracing::{error, info};

use crate::error::{Result, RuntimeError};
use crate::repository::GameRepository;

/// Owns every `GameState` by id, loading from the repository at startup and
/// saving after each mutating operation. All mutation is funneled through
/// the single worker task, so writes are naturally serialized.
pub struct GameStore {
    games: BTreeMap<String, GameState>,
    repo: Arc<dyn GameRepository>,
}

impl GameStore {
    pub fn load(repo: Arc<dyn GameRepository>) -> Result<Self> {
        let games = repo.load_all()?;
        info!(games = games.len(), "game store loaded");
        Ok(Self { games, repo })
    }

    pub fn create(
        &mut self,
        game_id: &str,
        red_user: &str,
        blue_user: &str,
        seed: u64,
    ) -> Result<()> {
        if self.games.contains_key(game_id) {
            return Err(RuntimeError::GameExists(game_id.to_string()));
        }
        self.games.insert(
            game_id.to_string(),
            GameState::new(game_id, red_user, blue_user, seed),
        );
        Ok(())
    }

    pub fn get(&self, game_id: &str) -> Result<&GameState> {
        self.games
            .get(game_id)
            .ok_or_else(|| RuntimeError::GameNotFound(game_id.to_string()))
    }

    pub fn get_mut(&mut self, game_id: &str) -> Result<&mut GameState> {
        self.games
            .get_mut(game_id)
            .ok_or_else(|| RuntimeError::GameNotFound(game_id.to_string()))
    }

    /// Persists the full store. A persistence failure is logged and
    /// reported, but the in-memory mutation stands: the record must never
    /// be corrupted by a collaborator failure.
    pub fn persist(&self) -> Result<()> {
        self.repo.save_all(&self.games).inspect_err(|e| {
            error!("persist failed: {e}");
        })?;
        Ok(())
    }
}
