//! Figure identity, footprints, and health bookkeeping.

use core::fmt;
use core::str::FromStr;

use arrayvec::ArrayVec;

use crate::config::GameConfig;

use super::Position;

/// Stable identity of one physical miniature: deployment card name, the
/// deployment group index (a squad may field the same card twice), and the
/// figure index within the card.
///
/// The key never changes for the lifetime of a match and indexes position,
/// orientation, and health lookups.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FigureKey {
    pub dc_name: String,
    pub group: u8,
    pub figure: u8,
}

impl FigureKey {
    pub fn new(dc_name: impl Into<String>, group: u8, figure: u8) -> Self {
        Self {
            dc_name: dc_name.into(),
            group,
            figure,
        }
    }
}

impl fmt::Display for FigureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.dc_name, self.group, self.figure)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed figure key")]
pub struct ParseFigureKeyError;

impl FromStr for FigureKey {
    type Err = ParseFigureKeyError;

    /// Parses `name-group-figure`. Card names may themselves contain dashes,
    /// so the two trailing numeric segments are split off from the right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, '-');
        let figure = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or(ParseFigureKeyError)?;
        let group = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or(ParseFigureKeyError)?;
        let dc_name = parts.next().filter(|p| !p.is_empty()).ok_or(ParseFigureKeyError)?;
        Ok(Self::new(dc_name, group, figure))
    }
}

// Serialized as the canonical display string so figure keys can be used as
// JSON map keys in the persisted game record.
#[cfg(feature = "serde")]
impl serde::Serialize for FigureKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FigureKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Cells occupied by a figure, bounded by the largest supported footprint.
pub type FootprintCells = ArrayVec<Position, { GameConfig::MAX_FOOTPRINT_CELLS }>;

/// Size class of a figure's base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Footprint {
    /// 1x1.
    #[default]
    Single,
    /// 1x2.
    Long,
    /// 2x2.
    Large,
    /// 2x3, orientation chosen at deployment.
    Massive,
}

/// Orientation of non-square footprints. Square footprints ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Wider than tall.
    #[default]
    Horizontal,
    /// Taller than wide.
    Vertical,
}

impl Footprint {
    /// (width, height) in cells for the given orientation.
    pub fn dims(self, orientation: Orientation) -> (i32, i32) {
        let (w, h) = match self {
            Footprint::Single => (1, 1),
            Footprint::Long => (2, 1),
            Footprint::Large => (2, 2),
            Footprint::Massive => (3, 2),
        };
        match orientation {
            Orientation::Horizontal => (w, h),
            Orientation::Vertical => (h, w),
        }
    }

    /// All cells covered when the top-left cell sits at `origin`.
    pub fn cells(self, origin: Position, orientation: Orientation) -> FootprintCells {
        let (w, h) = self.dims(orientation);
        let mut cells = FootprintCells::new();
        for dy in 0..h {
            for dx in 0..w {
                cells.push(Position::new(origin.x + dx, origin.y + dy));
            }
        }
        cells
    }

    /// Massive figures displace smaller figures when they arrive.
    pub fn is_massive(self) -> bool {
        matches!(self, Footprint::Massive)
    }

    /// Whether the footprint has a meaningful orientation choice.
    pub fn is_rotatable(self) -> bool {
        !matches!(self, Footprint::Single | Footprint::Large)
    }
}

/// Health of one figure: `0 <= current <= max`. A figure at zero is defeated
/// and must not appear on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FigureHealth {
    pub current: u32,
    pub max: u32,
}

impl FigureHealth {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Applies damage, clamping at zero. Returns the damage actually dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current);
        self.current -= dealt;
        dealt
    }

    /// Recovers health, clamping at max. Returns the amount actually healed.
    pub fn recover(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max - self.current);
        self.current += healed;
        healed
    }

    pub fn is_defeated(&self) -> bool {
        self.current == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_key_round_trips_through_display() {
        let key = FigureKey::new("Elite Royal Guard", 1, 0);
        let parsed: FigureKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn figure_key_parses_dashed_card_names() {
        let parsed: FigureKey = "E-Web Engineer-0-1".parse().unwrap();
        assert_eq!(parsed, FigureKey::new("E-Web Engineer", 0, 1));
    }

    #[test]
    fn massive_footprint_rotates() {
        let origin = Position::new(2, 3);
        let horizontal = Footprint::Massive.cells(origin, Orientation::Horizontal);
        let vertical = Footprint::Massive.cells(origin, Orientation::Vertical);
        assert_eq!(horizontal.len(), 6);
        assert!(horizontal.contains(&Position::new(4, 4)));
        assert!(vertical.contains(&Position::new(3, 5)));
    }

    #[test]
    fn health_clamps_at_bounds() {
        let mut health = FigureHealth::full(5);
        assert_eq!(health.apply_damage(7), 5);
        assert!(health.is_defeated());
        assert_eq!(health.recover(99), 5);
        assert_eq!(health.current, 5);
    }
}
