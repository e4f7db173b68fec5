//! Data-driven content definitions and loaders.
//!
//! This crate houses the static game content formats and provides loaders
//! for RON/TOML data files:
//! - Card sets: deployment cards, command cards, scripted abilities (RON)
//! - Map geometry: terrain, doors, deployment and mission zones (RON)
//! - Mission definitions: tokens, terminals, scoring rules (RON)
//! - Match rule overrides (TOML)
//!
//! Content is consumed by runtime oracles and never appears in game state.
//! All loaders deserialize into skirmish-core types directly with serde.

pub mod loaders;

pub use loaders::{
    CardLoader, CardSet, ConfigLoader, MapGeometry, MapLoader, MissionLoader,
};
