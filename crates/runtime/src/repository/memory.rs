//! In-memory GameRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use skirmish_core::GameState;

use super::{GameRepository, RepositoryError, Result};

/// Keeps the whole game map behind an `RwLock`. Used when persistence
/// across restarts is not needed.
#[derive(Default)]
pub struct InMemoryGameRepo {
    games: RwLock<BTreeMap<String, GameState>>,
}

impl InMemoryGameRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameRepository for InMemoryGameRepo {
    fn load_all(&self) -> Result<BTreeMap<String, GameState>> {
        let games = self.games.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(games.clone())
    }

    fn save_all(&self, games: &BTreeMap<String, GameState>) -> Result<()> {
        let mut slot = self.games.write().map_err(|_| RepositoryError::LockPoisoned)?;
        *slot = games.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_games() {
        let repo = InMemoryGameRepo::new();
        let mut games = BTreeMap::new();
        games.insert(
            "g1".to_string(),
            GameState::new("g1", "alice", "bob", 42),
        );
        repo.save_all(&games).unwrap();
        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["g1"].game_seed, 42);
    }
}
