//! Traits describing read-only world data.
//!
//! Oracles expose card stats, map geometry, mission rules, and deterministic
//! randomness. The [`GameEnv`] aggregate bundles them so the engine can reach
//! everything it needs without coupling to concrete implementations; missing
//! oracles surface as [`OracleError`] at the point of use.

mod cards;
mod error;
mod map;
mod mission;
mod rng;

pub use cards::{
    AbilityDef, AbilityEffect, AttackType, CardOracle, CommandCard, DeploymentCard, SurgeAbility,
    SurgeEffect,
};
pub use error::OracleError;
pub use map::{DeploymentZone, Door, MapDimensions, MapOracle, TerrainKind};
pub use mission::{MissionDef, MissionOracle, MissionRule};
pub use rng::{PcgRng, RngOracle, compute_seed};

/// Aggregates the read-only oracles required by the action pipeline.
#[derive(Clone, Copy)]
pub struct GameEnv<'a> {
    cards: Option<&'a dyn CardOracle>,
    map: Option<&'a dyn MapOracle>,
    missions: Option<&'a dyn MissionOracle>,
    rng: Option<&'a dyn RngOracle>,
}

impl<'a> GameEnv<'a> {
    pub fn new(
        cards: Option<&'a dyn CardOracle>,
        map: Option<&'a dyn MapOracle>,
        missions: Option<&'a dyn MissionOracle>,
        rng: Option<&'a dyn RngOracle>,
    ) -> Self {
        Self {
            cards,
            map,
            missions,
            rng,
        }
    }

    pub fn with_all(
        cards: &'a dyn CardOracle,
        map: &'a dyn MapOracle,
        missions: &'a dyn MissionOracle,
        rng: &'a dyn RngOracle,
    ) -> Self {
        Self::new(Some(cards), Some(map), Some(missions), Some(rng))
    }

    pub fn empty() -> Self {
        Self::new(None, None, None, None)
    }

    pub fn cards(&self) -> Result<&'a dyn CardOracle, OracleError> {
        self.cards.ok_or(OracleError::CardsNotAvailable)
    }

    pub fn map(&self) -> Result<&'a dyn MapOracle, OracleError> {
        self.map.ok_or(OracleError::MapNotAvailable)
    }

    pub fn missions(&self) -> Result<&'a dyn MissionOracle, OracleError> {
        self.missions.ok_or(OracleError::MissionsNotAvailable)
    }

    pub fn rng(&self) -> Result<&'a dyn RngOracle, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }
}

impl core::fmt::Debug for GameEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameEnv")
            .field("cards", &self.cards.is_some())
            .field("map", &self.map.is_some())
            .field("missions", &self.missions.is_some())
            .field("rng", &self.rng.is_some())
            .finish()
    }
}
