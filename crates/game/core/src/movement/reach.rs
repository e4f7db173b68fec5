//! Uniform-cost reachability over the map adjacency graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::env::MapOracle;
use crate::state::{BoardState, FigureKey, Position};

use super::MovementProfile;

/// Result of one reachability expansion, keyed by the inputs that produced
/// it so stale caches can be detected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachCache {
    pub start: Position,
    pub budget: u8,
    pub profile: MovementProfile,
    /// Minimum cost to each reachable top-left cell (start included at 0).
    pub costs: BTreeMap<Position, u8>,
    /// Predecessor per reached cell, for path reconstruction. Ties resolve
    /// to the row-major smallest predecessor so logged paths are stable.
    pub parents: BTreeMap<Position, Position>,
}

impl ReachCache {
    /// Destinations whose minimal cost is exactly `distance`, in row-major
    /// order. Movement commits a distance first; only these cells are legal.
    pub fn destinations_at(&self, distance: u8) -> Vec<Position> {
        self.costs
            .iter()
            .filter(|(pos, cost)| **cost == distance && **pos != self.start)
            .map(|(pos, _)| *pos)
            .collect()
    }

    pub fn cost_of(&self, destination: Position) -> Option<u8> {
        self.costs.get(&destination).copied()
    }
}

/// How a candidate top-left cell may participate in the expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellEntry {
    /// Fully traversable: a destination and an intermediate step.
    Open { cost: u8 },
    /// Valid destination only (massive arrival displacing an occupant);
    /// the expansion does not continue through it.
    TerminalOnly { cost: u8 },
    Blocked,
}

/// Computes every top-left cell reachable within `budget` movement points,
/// honoring footprint bounds, terrain, closed doors, occupancy, and the
/// massive-figure push rule.
pub fn compute_reachable(
    board: &BoardState,
    map: &dyn MapOracle,
    mover: &FigureKey,
    start: Position,
    budget: u8,
    profile: &MovementProfile,
) -> ReachCache {
    let mut cache = ReachCache {
        start,
        budget,
        profile: profile.clone(),
        costs: BTreeMap::new(),
        parents: BTreeMap::new(),
    };
    cache.costs.insert(start, 0);

    let mut frontier: BinaryHeap<Reverse<(u8, Position)>> = BinaryHeap::new();
    frontier.push(Reverse((0, start)));

    while let Some(Reverse((cost, cell))) = frontier.pop() {
        if cache.costs.get(&cell).copied() != Some(cost) {
            continue; // superseded entry
        }
        for neighbor in cell.neighbors() {
            let entry = classify(board, map, mover, neighbor, profile);
            let (step, terminal) = match entry {
                CellEntry::Open { cost } => (cost, false),
                CellEntry::TerminalOnly { cost } => (cost, true),
                CellEntry::Blocked => continue,
            };
            let next_cost = cost.saturating_add(step);
            if next_cost > budget {
                continue;
            }
            match cache.costs.get(&neighbor).copied() {
                Some(best) if next_cost > best => continue,
                Some(best) if next_cost == best => {
                    // Equal-cost path: keep the row-major smallest parent so
                    // reconstruction is deterministic.
                    if cache
                        .parents
                        .get(&neighbor)
                        .is_some_and(|existing| cell < *existing)
                    {
                        cache.parents.insert(neighbor, cell);
                    }
                    continue;
                }
                _ => {}
            }
            cache.costs.insert(neighbor, next_cost);
            cache.parents.insert(neighbor, cell);
            if !terminal {
                frontier.push(Reverse((next_cost, neighbor)));
            }
        }
    }

    cache
}

/// Classifies a candidate top-left cell for the mover's footprint.
fn classify(
    board: &BoardState,
    map: &dyn MapOracle,
    mover: &FigureKey,
    top_left: Position,
    profile: &MovementProfile,
) -> CellEntry {
    let cells = profile.footprint.cells(top_left, profile.orientation);
    let mut entry_cost = 1u8;
    let mut displaced: Option<FigureKey> = None;

    for cell in &cells {
        let Some(terrain) = map.terrain(*cell).filter(|_| map.contains(*cell)) else {
            return CellEntry::Blocked;
        };
        if !terrain.is_traversable() {
            return CellEntry::Blocked;
        }
        if !profile.mobile {
            entry_cost = entry_cost.max(terrain.entry_cost());
        }
        if let Some(door) = map.door_at(*cell)
            && !board.open_doors.contains(&door)
        {
            return CellEntry::Blocked;
        }
        if let Some(occupant) = board.occupant_at(*cell).filter(|o| *o != mover) {
            if !profile.massive {
                return CellEntry::Blocked;
            }
            let occupant = occupant.clone();
            // Massive figures may arrive on top of exactly one smaller
            // figure, pushing it aside.
            if board.cells_of(&occupant).len() >= cells.len() {
                return CellEntry::Blocked;
            }
            match &displaced {
                Some(existing) if *existing != occupant => return CellEntry::Blocked,
                _ => displaced = Some(occupant),
            }
        }
    }

    match displaced {
        None => CellEntry::Open { cost: entry_cost },
        Some(occupant) => {
            if displacement_cell(board, map, mover, &occupant, top_left, profile).is_some() {
                CellEntry::TerminalOnly { cost: entry_cost }
            } else {
                CellEntry::Blocked
            }
        }
    }
}

/// Finds the row-major smallest free cell the displaced figure can be pushed
/// to once the massive figure occupies `arrival`, or `None` when no push is
/// possible (the arrival is then illegal).
pub fn displacement_cell(
    board: &BoardState,
    map: &dyn MapOracle,
    mover: &FigureKey,
    displaced: &FigureKey,
    arrival: Position,
    profile: &MovementProfile,
) -> Option<Position> {
    let arrival_cells = profile.footprint.cells(arrival, profile.orientation);
    let mut candidates: Vec<Position> = board
        .cells_of(displaced)
        .iter()
        .flat_map(|cell| cell.neighbors())
        .collect();
    candidates.sort();
    candidates.dedup();
    candidates.into_iter().find(|cell| {
        map.contains(*cell)
            && map.terrain(*cell).is_some_and(|t| t.is_traversable())
            && map
                .door_at(*cell)
                .is_none_or(|door| board.open_doors.contains(&door))
            && !arrival_cells.contains(cell)
            && !board.is_occupied(*cell, Some(displaced))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Door, MapDimensions, TerrainKind};
    use crate::state::{Footprint, Orientation, Side};

    struct OpenGrid {
        size: u32,
        difficult: Vec<Position>,
        walls: Vec<Position>,
        doors: Vec<Door>,
    }

    impl OpenGrid {
        fn new(size: u32) -> Self {
            Self {
                size,
                difficult: Vec::new(),
                walls: Vec::new(),
                doors: Vec::new(),
            }
        }
    }

    impl MapOracle for OpenGrid {
        fn dimensions(&self) -> MapDimensions {
            MapDimensions::new(self.size, self.size)
        }

        fn terrain(&self, position: Position) -> Option<TerrainKind> {
            if !self.dimensions().contains(position) {
                return None;
            }
            if self.walls.contains(&position) {
                Some(TerrainKind::Blocking)
            } else if self.difficult.contains(&position) {
                Some(TerrainKind::Difficult)
            } else {
                Some(TerrainKind::Open)
            }
        }

        fn doors(&self) -> Vec<Door> {
            self.doors.clone()
        }

        fn deployment_zone(&self, _zone: crate::env::DeploymentZone) -> Vec<Position> {
            Vec::new()
        }
    }

    fn key(name: &str) -> FigureKey {
        FigureKey::new(name, 0, 0)
    }

    fn profile() -> MovementProfile {
        MovementProfile::default()
    }

    #[test]
    fn open_grid_reach_matches_chebyshev_distance() {
        let map = OpenGrid::new(4);
        let board = BoardState::default();
        let start = Position::new(0, 0);
        let cache = compute_reachable(&board, &map, &key("Trooper"), start, 4, &profile());

        for y in 0..4 {
            for x in 0..4 {
                let cell = Position::new(x, y);
                let expected = start.distance(cell) as u8;
                assert_eq!(cache.cost_of(cell), Some(expected), "cell {cell}");
            }
        }
    }

    #[test]
    fn exact_distance_filter_excludes_closer_cells() {
        let map = OpenGrid::new(5);
        let board = BoardState::default();
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 0), 3, &profile());
        let at_two = cache.destinations_at(2);
        assert!(at_two.iter().all(|c| Position::new(0, 0).distance(*c) == 2));
        assert!(!at_two.contains(&Position::new(1, 0)));
    }

    #[test]
    fn occupied_cells_block() {
        let map = OpenGrid::new(3);
        let mut board = BoardState::default();
        board.place(
            key("Guard"),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(1, 0),
        );
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 0), 2, &profile());
        assert_eq!(cache.cost_of(Position::new(1, 0)), None);
        // Route around still works.
        assert_eq!(cache.cost_of(Position::new(2, 0)), Some(2));
    }

    #[test]
    fn difficult_terrain_costs_extra_unless_mobile() {
        let mut map = OpenGrid::new(3);
        map.difficult.push(Position::new(1, 0));
        let board = BoardState::default();
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 0), 4, &profile());
        assert_eq!(cache.cost_of(Position::new(1, 0)), Some(2));

        let mobile = MovementProfile {
            mobile: true,
            ..profile()
        };
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 0), 4, &mobile);
        assert_eq!(cache.cost_of(Position::new(1, 0)), Some(1));
    }

    #[test]
    fn closed_doors_block_until_opened() {
        let mut map = OpenGrid::new(3);
        map.walls = vec![Position::new(1, 0), Position::new(1, 2)];
        map.doors.push(Door {
            id: 7,
            cells: vec![Position::new(1, 1)],
        });
        let mut board = BoardState::default();
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 1), 2, &profile());
        assert_eq!(cache.cost_of(Position::new(1, 1)), None);

        board.open_doors.insert(7);
        let cache =
            compute_reachable(&board, &map, &key("Trooper"), Position::new(0, 1), 2, &profile());
        assert_eq!(cache.cost_of(Position::new(1, 1)), Some(1));
    }

    #[test]
    fn footprint_destinations_need_every_cell_free() {
        let map = OpenGrid::new(4);
        let board = BoardState::default();
        let large = MovementProfile {
            footprint: Footprint::Large,
            ..profile()
        };
        let cache =
            compute_reachable(&board, &map, &key("Nexu"), Position::new(0, 0), 4, &large);
        // Top-left (3, 0) would overflow the 4x4 grid with a 2x2 footprint.
        assert_eq!(cache.cost_of(Position::new(3, 0)), None);
        assert!(cache.cost_of(Position::new(2, 2)).is_some());
    }

    #[test]
    fn massive_arrival_displaces_smaller_figure() {
        let map = OpenGrid::new(6);
        let mut board = BoardState::default();
        board.place(
            key("Scout"),
            Side::Blue,
            Footprint::Single,
            Orientation::Horizontal,
            Position::new(2, 1),
        );
        let massive = MovementProfile {
            footprint: Footprint::Massive,
            massive: true,
            ..profile()
        };
        let cache =
            compute_reachable(&board, &map, &key("AT-ST"), Position::new(0, 0), 3, &massive);
        // Arrival over the scout is allowed because a push cell exists.
        assert!(cache.cost_of(Position::new(1, 0)).is_some());
        let push = displacement_cell(
            &board,
            &map,
            &key("AT-ST"),
            &key("Scout"),
            Position::new(1, 0),
            &massive,
        );
        assert!(push.is_some());
        assert!(!massive.footprint.cells(Position::new(1, 0), massive.orientation)
            .contains(&push.unwrap()));
    }
}
