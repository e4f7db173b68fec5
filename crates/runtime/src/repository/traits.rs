//! Repository contract for the per-match game records.

use std::collections::BTreeMap;

use skirmish_core::GameState;

use super::RepositoryError;

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Stores every match record keyed by game id.
///
/// `save_all` must be atomic: a reader never observes a partially written
/// set of games. Implementations should treat saving unchanged state as a
/// no-op.
pub trait GameRepository: Send + Sync {
    /// Load all persisted games. An empty store is not an error.
    fn load_all(&self) -> Result<BTreeMap<String, GameState>>;

    /// Persist all games, replacing the previous snapshot.
    fn save_all(&self, games: &BTreeMap<String, GameState>) -> Result<()>;
}
