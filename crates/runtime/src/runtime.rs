//! Runtime assembly: configuration, store/oracle wiring, worker spawn.

use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::Result;
use crate::events::EventBus;
use crate::handle::RuntimeHandle;
use crate::oracle::OracleManager;
use crate::repository::{FileGameRepo, GameRepository, InMemoryGameRepo};
use crate::store::GameStore;
use crate::worker;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Where the game store file lives. `None` uses the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Keep everything in memory (tests, throwaway sessions).
    pub in_memory: bool,
    /// Content pack directory; `None` uses the built-in demo content.
    pub content_dir: Option<PathBuf>,
    /// Command channel capacity.
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            in_memory: false,
            content_dir: None,
            channel_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// In-memory configuration with demo content, for tests.
    pub fn ephemeral() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    fn store_path(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.join("games.json");
        }
        ProjectDirs::from("rs", "skirmish", "skirmish")
            .map(|dirs| dirs.data_dir().join("games.json"))
            .unwrap_or_else(|| PathBuf::from("games.json"))
    }
}

/// Entry point: builds the store and oracles, spawns the command worker,
/// and returns the client handle.
pub struct Runtime;

impl Runtime {
    pub async fn start(config: RuntimeConfig) -> Result<RuntimeHandle> {
        let repo: Arc<dyn GameRepository> = if config.in_memory {
            Arc::new(InMemoryGameRepo::new())
        } else {
            let path = config.store_path();
            info!(path = %path.display(), "using file store");
            Arc::new(FileGameRepo::new(path))
        };

        let store = GameStore::load(repo)?;
        let oracles = match &config.content_dir {
            Some(dir) => OracleManager::from_dir(dir)?,
            None => OracleManager::demo(),
        };

        let bus = EventBus::new();
        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
        tokio::spawn(worker::run(store, oracles, bus.clone(), command_rx));

        Ok(RuntimeHandle::new(command_tx, bus))
    }
}
