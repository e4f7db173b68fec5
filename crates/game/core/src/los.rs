//! Line-of-sight engine.
//!
//! Pure visibility tests, callable without a live game. An attack may only
//! target a cell it can see; the check runs before any dice are rolled.

use std::collections::BTreeSet;

use crate::env::MapOracle;
use crate::state::Position;

/// Whether sight is blocked at `cell`: blocking terrain, off-map space, or a
/// door that has not been opened.
fn blocks_sight(map: &dyn MapOracle, open_doors: &BTreeSet<u16>, cell: Position) -> bool {
    if !map.contains(cell) {
        return true;
    }
    if map.terrain(cell).is_none_or(|t| t.blocks_sight()) {
        return true;
    }
    map.door_at(cell)
        .is_some_and(|door| !open_doors.contains(&door))
}

/// Binary visibility between two cells.
///
/// Walks the center-to-center segment with an integer supercover traversal
/// and fails on the first sight-blocking cell strictly between the
/// endpoints. A segment that passes exactly through a cell corner slips
/// through unless both cells touching that corner block.
pub fn has_line_of_sight(
    map: &dyn MapOracle,
    open_doors: &BTreeSet<u16>,
    from: Position,
    to: Position,
) -> bool {
    if from == to {
        return true;
    }

    let nx = (to.x - from.x).unsigned_abs() as i64;
    let ny = (to.y - from.y).unsigned_abs() as i64;
    let step_x = (to.x - from.x).signum();
    let step_y = (to.y - from.y).signum();

    let mut cell = from;
    let (mut ix, mut iy) = (0i64, 0i64);

    while ix < nx || iy < ny {
        // Compares the fractional progress of the next vertical and
        // horizontal boundary crossings: (0.5+ix)/nx vs (0.5+iy)/ny.
        let decision = (1 + 2 * ix) * ny - (1 + 2 * iy) * nx;
        if decision == 0 {
            // Exact corner crossing.
            let side_a = Position::new(cell.x + step_x, cell.y);
            let side_b = Position::new(cell.x, cell.y + step_y);
            if blocks_sight(map, open_doors, side_a) && blocks_sight(map, open_doors, side_b) {
                return false;
            }
            cell = Position::new(cell.x + step_x, cell.y + step_y);
            ix += 1;
            iy += 1;
        } else if decision < 0 {
            cell = Position::new(cell.x + step_x, cell.y);
            ix += 1;
        } else {
            cell = Position::new(cell.x, cell.y + step_y);
            iy += 1;
        }
        if cell == to {
            break;
        }
        if blocks_sight(map, open_doors, cell) {
            return false;
        }
    }

    true
}

/// Footprint-aware visibility: an attack has line of sight when any attacker
/// cell sees any defender cell.
pub fn footprints_have_los(
    map: &dyn MapOracle,
    open_doors: &BTreeSet<u16>,
    from_cells: &[Position],
    to_cells: &[Position],
) -> bool {
    from_cells.iter().any(|from| {
        to_cells
            .iter()
            .any(|to| has_line_of_sight(map, open_doors, *from, *to))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{DeploymentZone, Door, MapDimensions, TerrainKind};

    struct WalledGrid {
        size: u32,
        walls: Vec<Position>,
        doors: Vec<Door>,
    }

    impl MapOracle for WalledGrid {
        fn dimensions(&self) -> MapDimensions {
            MapDimensions::new(self.size, self.size)
        }

        fn terrain(&self, position: Position) -> Option<TerrainKind> {
            if !self.dimensions().contains(position) {
                return None;
            }
            if self.walls.contains(&position) {
                Some(TerrainKind::Blocking)
            } else {
                Some(TerrainKind::Open)
            }
        }

        fn doors(&self) -> Vec<Door> {
            self.doors.clone()
        }

        fn deployment_zone(&self, _zone: DeploymentZone) -> Vec<Position> {
            Vec::new()
        }
    }

    fn grid(size: u32) -> WalledGrid {
        WalledGrid {
            size,
            walls: Vec::new(),
            doors: Vec::new(),
        }
    }

    #[test]
    fn open_ground_always_sees() {
        let map = grid(8);
        let doors = BTreeSet::new();
        assert!(has_line_of_sight(&map, &doors, Position::new(0, 0), Position::new(7, 3)));
        assert!(has_line_of_sight(&map, &doors, Position::new(5, 5), Position::new(5, 0)));
    }

    #[test]
    fn wall_between_blocks() {
        let mut map = grid(5);
        map.walls.push(Position::new(2, 0));
        let doors = BTreeSet::new();
        assert!(!has_line_of_sight(&map, &doors, Position::new(0, 0), Position::new(4, 0)));
        // A different row remains clear.
        assert!(has_line_of_sight(&map, &doors, Position::new(0, 1), Position::new(4, 1)));
    }

    #[test]
    fn closed_door_blocks_until_opened() {
        let mut map = grid(5);
        map.doors.push(Door {
            id: 3,
            cells: vec![Position::new(2, 2)],
        });
        let mut doors = BTreeSet::new();
        assert!(!has_line_of_sight(&map, &doors, Position::new(0, 2), Position::new(4, 2)));
        doors.insert(3);
        assert!(has_line_of_sight(&map, &doors, Position::new(0, 2), Position::new(4, 2)));
    }

    #[test]
    fn corner_needs_both_cells_blocked() {
        let mut map = grid(4);
        // Diagonal from (0,0) to (3,3) passes corners at (1,1), (2,2)...
        map.walls.push(Position::new(1, 0));
        let doors = BTreeSet::new();
        // One blocked corner cell still lets sight slip through.
        assert!(has_line_of_sight(&map, &doors, Position::new(0, 0), Position::new(3, 3)));
        map.walls.push(Position::new(0, 1));
        assert!(!has_line_of_sight(&map, &doors, Position::new(0, 0), Position::new(3, 3)));
    }

    #[test]
    fn footprint_pairs_take_the_best_line() {
        let mut map = grid(5);
        map.walls.push(Position::new(1, 0));
        let doors = BTreeSet::new();
        let attacker = [Position::new(0, 0), Position::new(0, 1)];
        let defender = [Position::new(4, 0)];
        // (0,0) is walled off but (0,1) has a diagonal line.
        assert!(footprints_have_los(&map, &doors, &attacker, &defender));
    }
}
