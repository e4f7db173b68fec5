//! Board occupancy: figure positions, orientations, doors, and tokens.

use std::collections::{BTreeMap, BTreeSet};

use super::common::Position;
use super::figure::{FigureKey, Footprint, FootprintCells, Orientation};
use super::player::Side;

/// Mission token kinds tracked on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    Crate,
    Contraband,
}

/// A mission token, either lying on a cell or carried by a figure.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenState {
    pub kind: TokenKind,
    pub position: Option<Position>,
    pub carried_by: Option<FigureKey>,
}

impl TokenState {
    pub fn on_cell(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            position: Some(position),
            carried_by: None,
        }
    }
}

/// Dynamic board state layered over the static map geometry.
///
/// A figure has at most one entry in `positions`; defeated figures are
/// removed entirely. All maps are keyed by [`FigureKey`] so the record
/// serializes with stable, human-readable keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardState {
    /// Top-left footprint cell per figure.
    positions: BTreeMap<FigureKey, Position>,
    /// Footprint size class per placed figure.
    footprints: BTreeMap<FigureKey, Footprint>,
    /// Orientation per placed figure (meaningful for rotatable footprints).
    orientations: BTreeMap<FigureKey, Orientation>,
    /// Owning side per placed figure.
    owners: BTreeMap<FigureKey, Side>,
    /// Doors opened via Interact. Closed doors block movement and sight.
    pub open_doors: BTreeSet<u16>,
    /// Mission tokens currently in play.
    pub tokens: Vec<TokenState>,
    /// Named mission counters (e.g. tokens seeded from hand size).
    pub counters: BTreeMap<String, i32>,
}

impl BoardState {
    /// Places a figure. Replaces any previous position for the same key.
    pub fn place(
        &mut self,
        key: FigureKey,
        side: Side,
        footprint: Footprint,
        orientation: Orientation,
        top_left: Position,
    ) {
        self.footprints.insert(key.clone(), footprint);
        self.orientations.insert(key.clone(), orientation);
        self.owners.insert(key.clone(), side);
        self.positions.insert(key, top_left);
    }

    /// Removes a figure from the board (defeat or undo). Returns its last
    /// position if it was placed.
    pub fn remove(&mut self, key: &FigureKey) -> Option<Position> {
        self.footprints.remove(key);
        self.orientations.remove(key);
        self.owners.remove(key);
        // Carried tokens drop where the figure stood.
        let last = self.positions.remove(key);
        for token in &mut self.tokens {
            if token.carried_by.as_ref() == Some(key) {
                token.carried_by = None;
                token.position = last;
            }
        }
        last
    }

    pub fn move_to(&mut self, key: &FigureKey, top_left: Position) -> Option<Position> {
        let slot = self.positions.get_mut(key)?;
        let previous = *slot;
        *slot = top_left;
        Some(previous)
    }

    pub fn position_of(&self, key: &FigureKey) -> Option<Position> {
        self.positions.get(key).copied()
    }

    pub fn footprint_of(&self, key: &FigureKey) -> Footprint {
        self.footprints.get(key).copied().unwrap_or_default()
    }

    pub fn orientation_of(&self, key: &FigureKey) -> Orientation {
        self.orientations.get(key).copied().unwrap_or_default()
    }

    pub fn owner_of(&self, key: &FigureKey) -> Option<Side> {
        self.owners.get(key).copied()
    }

    pub fn is_placed(&self, key: &FigureKey) -> bool {
        self.positions.contains_key(key)
    }

    /// All cells covered by a placed figure.
    pub fn cells_of(&self, key: &FigureKey) -> FootprintCells {
        match self.position_of(key) {
            Some(origin) => self
                .footprint_of(key)
                .cells(origin, self.orientation_of(key)),
            None => FootprintCells::new(),
        }
    }

    /// The figure covering `cell`, if any.
    pub fn occupant_at(&self, cell: Position) -> Option<&FigureKey> {
        self.positions
            .keys()
            .find(|key| self.cells_of(key).contains(&cell))
    }

    /// Whether `cell` is covered by any figure other than `ignore`.
    pub fn is_occupied(&self, cell: Position, ignore: Option<&FigureKey>) -> bool {
        self.positions
            .keys()
            .filter(|key| Some(*key) != ignore)
            .any(|key| self.cells_of(key).contains(&cell))
    }

    /// Minimum cell-to-cell distance between two placed figures, counting
    /// diagonals as one. `None` when either figure is off the board.
    pub fn distance_between(&self, a: &FigureKey, b: &FigureKey) -> Option<u32> {
        let a_cells = self.cells_of(a);
        let b_cells = self.cells_of(b);
        if a_cells.is_empty() || b_cells.is_empty() {
            return None;
        }
        a_cells
            .iter()
            .flat_map(|ac| b_cells.iter().map(move |bc| ac.distance(*bc)))
            .min()
    }

    pub fn are_adjacent(&self, a: &FigureKey, b: &FigureKey) -> bool {
        self.distance_between(a, b) == Some(1)
    }

    /// Placed figures owned by `side`, in key order.
    pub fn figures_of(&self, side: Side) -> impl Iterator<Item = &FigureKey> {
        self.owners
            .iter()
            .filter(move |(_, s)| **s == side)
            .map(|(key, _)| key)
    }

    /// Placed enemy figures adjacent to `key`, in key order.
    pub fn adjacent_enemies(&self, key: &FigureKey) -> Vec<FigureKey> {
        let Some(side) = self.owner_of(key) else {
            return Vec::new();
        };
        self.figures_of(side.opponent())
            .filter(|enemy| self.are_adjacent(key, enemy))
            .cloned()
            .collect()
    }

    /// Iterates placed figures with their render data (cell, dims, side).
    pub fn render_entries(
        &self,
    ) -> impl Iterator<Item = (&FigureKey, Position, (i32, i32), Side)> {
        self.positions.iter().map(|(key, pos)| {
            let dims = self.footprint_of(key).dims(self.orientation_of(key));
            let side = self.owner_of(key).unwrap_or(Side::Red);
            (key, *pos, dims, side)
        })
    }

    pub fn token_at(&self, cell: Position) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.position == Some(cell) && t.carried_by.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> FigureKey {
        FigureKey::new(name, 0, 0)
    }

    #[test]
    fn footprint_occupancy_covers_all_cells() {
        let mut board = BoardState::default();
        board.place(
            key("Nexu"),
            Side::Blue,
            Footprint::Large,
            Orientation::Horizontal,
            Position::new(4, 4),
        );
        assert!(board.is_occupied(Position::new(5, 5), None));
        assert!(!board.is_occupied(Position::new(6, 4), None));
        assert_eq!(board.occupant_at(Position::new(4, 5)), Some(&key("Nexu")));
    }

    #[test]
    fn distance_uses_nearest_footprint_pair() {
        let mut board = BoardState::default();
        board.place(
            key("AT-ST"),
            Side::Red,
            Footprint::Massive,
            Orientation::Horizontal,
            Position::new(0, 0),
        );
        board.place(
            key("Luke Skywalker"),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(3, 1),
        );
        // Nearest AT-ST cell is (2, 1).
        assert_eq!(
            board.distance_between(&key("AT-ST"), &key("Luke Skywalker")),
            Some(1)
        );
        assert!(board.are_adjacent(&key("AT-ST"), &key("Luke Skywalker")));
    }

    #[test]
    fn removing_a_carrier_drops_its_token() {
        let mut board = BoardState::default();
        board.place(
            key("Smuggler"),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(2, 2),
        );
        board.tokens.push(TokenState {
            kind: TokenKind::Contraband,
            position: None,
            carried_by: Some(key("Smuggler")),
        });
        board.remove(&key("Smuggler"));
        assert_eq!(board.tokens[0].carried_by, None);
        assert_eq!(board.tokens[0].position, Some(Position::new(2, 2)));
    }
}
