//! File-backed GameRepository: one JSON document for the whole store.
//!
//! Saves write to a sibling temp file and rename into place, so a crash
//! mid-save never leaves a partial document. Saving bytes identical to what
//! is already on disk skips the write entirely.

use std::collections::BTreeMap;
use std::path::PathBuf;

use skirmish_core::GameState;
use tracing::debug;

use super::{GameRepository, Result};

pub struct FileGameRepo {
    path: PathBuf,
}

impl FileGameRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl GameRepository for FileGameRepo {
    fn load_all(&self) -> Result<BTreeMap<String, GameState>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_all(&self, games: &BTreeMap<String, GameState>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(games)?;

        // Idempotence: unchanged state is a no-op.
        if let Ok(existing) = std::fs::read_to_string(&self.path)
            && existing == serialized
        {
            debug!(path = %self.path.display(), "save skipped, no changes");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), games = games.len(), "saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileGameRepo::new(dir.path().join("games.json"));
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileGameRepo::new(dir.path().join("games.json"));
        let mut games = BTreeMap::new();
        games.insert("g1".to_string(), GameState::new("g1", "a", "b", 7));
        repo.save_all(&games).unwrap();

        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded["g1"].game_id, "g1");
        assert_eq!(loaded["g1"].game_seed, 7);
    }

    #[test]
    fn resave_of_unchanged_state_keeps_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileGameRepo::new(dir.path().join("games.json"));
        let mut games = BTreeMap::new();
        games.insert("g1".to_string(), GameState::new("g1", "a", "b", 7));
        repo.save_all(&games).unwrap();
        let before = std::fs::metadata(repo.path()).unwrap().modified().unwrap();
        repo.save_all(&games).unwrap();
        let after = std::fs::metadata(repo.path()).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileGameRepo::new(dir.path().join("games.json"));
        let mut games = BTreeMap::new();
        games.insert("g1".to_string(), GameState::new("g1", "a", "b", 7));
        repo.save_all(&games).unwrap();
        assert!(!dir.path().join("games.json.tmp").exists());
    }
}
