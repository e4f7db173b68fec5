//! Static map geometry oracle.

use crate::state::Position;

/// Read-only map layout: terrain, doors, and zone geometry. Dynamic state
/// (which doors are open, token positions) lives on the game record.
pub trait MapOracle: Send + Sync {
    fn dimensions(&self) -> MapDimensions;

    /// Terrain of a cell, `None` when the cell is off-map (maps are not
    /// necessarily full rectangles).
    fn terrain(&self, position: Position) -> Option<TerrainKind>;

    /// All doors on the map.
    fn doors(&self) -> Vec<Door>;

    /// Cells of a deployment zone.
    fn deployment_zone(&self, zone: DeploymentZone) -> Vec<Position>;

    /// Cells of a named mission zone (scoring areas, delivery zones).
    /// Unknown names yield an empty zone.
    fn named_zone(&self, name: &str) -> Vec<Position> {
        let _ = name;
        Vec::new()
    }

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position) && self.terrain(position).is_some()
    }

    /// The closed-door covering a cell, if any.
    fn door_at(&self, position: Position) -> Option<u16> {
        self.doors()
            .into_iter()
            .find(|door| door.cells.contains(&position))
            .map(|door| door.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }
}

/// Canonical terrain classes.
///
/// - `Open` is freely traversable.
/// - `Difficult` costs one extra movement point to enter.
/// - `Impassable` blocks movement but not sight (pits, rubble).
/// - `Blocking` blocks movement and sight (walls, sealed crates).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    #[default]
    Open,
    Difficult,
    Impassable,
    Blocking,
}

impl TerrainKind {
    pub fn is_traversable(self) -> bool {
        matches!(self, TerrainKind::Open | TerrainKind::Difficult)
    }

    pub fn blocks_sight(self) -> bool {
        matches!(self, TerrainKind::Blocking)
    }

    /// Movement points to enter a cell of this terrain, when traversable.
    pub fn entry_cost(self) -> u8 {
        match self {
            TerrainKind::Difficult => 2,
            _ => 1,
        }
    }
}

/// A door covering one or more cells. Closed doors block movement and sight
/// until opened with an Interact.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Door {
    pub id: u16,
    pub cells: Vec<Position>,
}

/// The two deployment zones of a skirmish map. The initiative player picks
/// one; the opponent receives the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeploymentZone {
    A,
    B,
}

impl DeploymentZone {
    pub fn other(self) -> DeploymentZone {
        match self {
            DeploymentZone::A => DeploymentZone::B,
            DeploymentZone::B => DeploymentZone::A,
        }
    }
}
