//! File loaders for static content.

mod cards;
mod config;
mod map;
mod mission;

pub use cards::{CardLoader, CardSet};
pub use config::ConfigLoader;
pub use map::{MapGeometry, MapLoader};
pub use mission::MissionLoader;

use std::path::Path;

/// Result alias shared by all loaders.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))
}
