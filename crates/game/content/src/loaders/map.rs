//! Map geometry loader.
//!
//! Maps are sparse in the file: every in-bounds cell defaults to open
//! terrain and the RON lists only the exceptions, plus doors and zones.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::{Door, MapDimensions, Position, TerrainKind};

use crate::loaders::{LoadResult, read_file};

/// Loaded geometry of one skirmish map. The runtime wraps this in its
/// `MapOracle` implementation.
#[derive(Debug, Clone)]
pub struct MapGeometry {
    pub id: String,
    pub dimensions: MapDimensions,
    pub terrain: HashMap<Position, TerrainKind>,
    pub doors: Vec<Door>,
    pub zone_a: Vec<Position>,
    pub zone_b: Vec<Position>,
    pub named_zones: HashMap<String, Vec<Position>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapRon {
    id: String,
    dimensions: (u32, u32),
    /// (x, y, terrain) overrides; unlisted cells are open.
    #[serde(default)]
    terrain: Vec<(i32, i32, TerrainKind)>,
    #[serde(default)]
    doors: Vec<DoorRon>,
    zone_a: Vec<(i32, i32)>,
    zone_b: Vec<(i32, i32)>,
    #[serde(default)]
    named_zones: HashMap<String, Vec<(i32, i32)>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DoorRon {
    id: u16,
    cells: Vec<(i32, i32)>,
}

fn positions(cells: Vec<(i32, i32)>) -> Vec<Position> {
    cells.into_iter().map(|(x, y)| Position::new(x, y)).collect()
}

/// Loader for map data from RON files.
pub struct MapLoader;

impl MapLoader {
    /// Load map geometry from a RON file.
    pub fn load(path: &Path) -> LoadResult<MapGeometry> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse map geometry from RON text.
    pub fn parse(content: &str) -> LoadResult<MapGeometry> {
        let data: MapRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {e}"))?;

        let dimensions = MapDimensions::new(data.dimensions.0, data.dimensions.1);

        // Fill the rectangle with open ground, then apply overrides.
        let mut terrain = HashMap::new();
        for y in 0..dimensions.height {
            for x in 0..dimensions.width {
                terrain.insert(Position::new(x as i32, y as i32), TerrainKind::Open);
            }
        }
        for (x, y, kind) in data.terrain {
            terrain.insert(Position::new(x, y), kind);
        }

        Ok(MapGeometry {
            id: data.id,
            dimensions,
            terrain,
            doors: data
                .doors
                .into_iter()
                .map(|d| Door {
                    id: d.id,
                    cells: positions(d.cells),
                })
                .collect(),
            zone_a: positions(data.zone_a),
            zone_b: positions(data.zone_b),
            named_zones: data
                .named_zones
                .into_iter()
                .map(|(name, cells)| (name, positions(cells)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terrain_overrides_and_zones() {
        let map = MapLoader::parse(
            r#"(
                id: "training-ground",
                dimensions: (6, 4),
                terrain: [(2, 1, Blocking), (3, 1, Difficult)],
                doors: [(id: 1, cells: [(2, 2)])],
                zone_a: [(0, 0), (0, 1)],
                zone_b: [(5, 2), (5, 3)],
                named_zones: {"center": [(3, 2)]},
            )"#,
        )
        .unwrap();
        assert_eq!(map.terrain[&Position::new(2, 1)], TerrainKind::Blocking);
        assert_eq!(map.terrain[&Position::new(0, 0)], TerrainKind::Open);
        assert_eq!(map.doors[0].cells, vec![Position::new(2, 2)]);
        assert_eq!(map.named_zones["center"], vec![Position::new(3, 2)]);
    }
}
