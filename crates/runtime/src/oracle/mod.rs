//! Oracle implementations backed by loaded content.

mod demo;

use std::collections::HashMap;
use std::path::Path;

use skirmish_content::{CardLoader, CardSet, MapGeometry, MapLoader, MissionLoader};
use skirmish_core::{
    AbilityDef, CardOracle, CommandCard, DeploymentCard, DeploymentZone, Door, GameEnv,
    MapDimensions, MapOracle, MissionDef, MissionOracle, PcgRng, Position, TerrainKind,
};
use tracing::warn;

use crate::error::RuntimeError;

/// Owns all static content for the process and hands out oracle views.
pub struct OracleManager {
    cards: CardSet,
    maps: HashMap<String, MapGeometry>,
    missions: HashMap<String, MissionDef>,
    rng: PcgRng,
}

impl OracleManager {
    pub fn new(
        cards: CardSet,
        maps: HashMap<String, MapGeometry>,
        missions: HashMap<String, MissionDef>,
    ) -> Self {
        Self {
            cards,
            maps,
            missions,
            rng: PcgRng,
        }
    }

    /// Built-in demonstration content: a handful of cards, one map, one
    /// mission. Enough to run full matches in tests and local development.
    pub fn demo() -> Self {
        demo::build()
    }

    /// Load content from a directory: `cards.ron`, `missions.ron`, and
    /// `maps/*.ron`.
    pub fn from_dir(dir: &Path) -> Result<Self, RuntimeError> {
        let cards = CardLoader::load(&dir.join("cards.ron"))
            .map_err(|e| RuntimeError::Content(e.to_string()))?;
        let missions = MissionLoader::load(&dir.join("missions.ron"))
            .map_err(|e| RuntimeError::Content(e.to_string()))?;
        let mut maps = HashMap::new();
        let maps_dir = dir.join("maps");
        if maps_dir.is_dir() {
            let entries = std::fs::read_dir(&maps_dir)
                .map_err(|e| RuntimeError::Content(e.to_string()))?;
            for entry in entries {
                let path = entry
                    .map_err(|e| RuntimeError::Content(e.to_string()))?
                    .path();
                if path.extension().is_some_and(|e| e == "ron") {
                    match MapLoader::load(&path) {
                        Ok(map) => {
                            maps.insert(map.id.clone(), map);
                        }
                        Err(e) => warn!(path = %path.display(), "skipping bad map: {e}"),
                    }
                }
            }
        }
        Ok(Self::new(cards, maps, missions))
    }

    pub fn map_geometry(&self, id: &str) -> Option<&MapGeometry> {
        self.maps.get(id)
    }

    pub fn rng(&self) -> &PcgRng {
        &self.rng
    }

    /// Assembles the oracle environment for one engine call. The map view
    /// must outlive the returned env, so the caller keeps it alive.
    pub fn env<'a>(&'a self, map: Option<&'a MapView<'a>>) -> GameEnv<'a> {
        GameEnv::new(
            Some(self as &dyn CardOracle),
            map.map(|m| m as &dyn MapOracle),
            Some(self as &dyn MissionOracle),
            Some(&self.rng),
        )
    }
}

impl CardOracle for OracleManager {
    fn deployment_card(&self, name: &str) -> Option<DeploymentCard> {
        self.cards.deployment.get(name).cloned()
    }

    fn command_card(&self, name: &str) -> Option<CommandCard> {
        self.cards.command.get(name).cloned()
    }

    fn ability(&self, id: &str) -> Option<AbilityDef> {
        self.cards.abilities.get(id).cloned()
    }
}

impl MissionOracle for OracleManager {
    fn mission(&self, id: &str) -> Option<MissionDef> {
        self.missions.get(id).cloned()
    }
}

/// `MapOracle` view over loaded geometry.
pub struct MapView<'a> {
    geometry: &'a MapGeometry,
}

impl<'a> MapView<'a> {
    pub fn new(geometry: &'a MapGeometry) -> Self {
        Self { geometry }
    }
}

impl MapOracle for MapView<'_> {
    fn dimensions(&self) -> MapDimensions {
        self.geometry.dimensions
    }

    fn terrain(&self, position: Position) -> Option<TerrainKind> {
        self.geometry.terrain.get(&position).copied()
    }

    fn doors(&self) -> Vec<Door> {
        self.geometry.doors.clone()
    }

    fn deployment_zone(&self, zone: DeploymentZone) -> Vec<Position> {
        match zone {
            DeploymentZone::A => self.geometry.zone_a.clone(),
            DeploymentZone::B => self.geometry.zone_b.clone(),
        }
    }

    fn named_zone(&self, name: &str) -> Vec<Position> {
        self.geometry
            .named_zones
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}
