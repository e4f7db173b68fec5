//! Path reconstruction for movement logs.

use crate::state::Position;

use super::ReachCache;

/// Reconstructs the cell sequence from the cache start to `destination`,
/// inclusive at both ends. Returns `None` if the destination was never
/// reached. Because equal-cost relaxations keep the row-major smallest
/// parent, the same inputs always reproduce the same path.
pub fn reconstruct_path(cache: &ReachCache, destination: Position) -> Option<Vec<Position>> {
    cache.costs.get(&destination)?;
    let mut path = vec![destination];
    let mut cursor = destination;
    while cursor != cache.start {
        cursor = *cache.parents.get(&cursor)?;
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{DeploymentZone, Door, MapDimensions, MapOracle, TerrainKind};
    use crate::movement::{MovementProfile, compute_reachable};
    use crate::state::{BoardState, FigureKey};

    struct Grid(u32);

    impl MapOracle for Grid {
        fn dimensions(&self) -> MapDimensions {
            MapDimensions::new(self.0, self.0)
        }

        fn terrain(&self, position: Position) -> Option<TerrainKind> {
            self.dimensions().contains(position).then_some(TerrainKind::Open)
        }

        fn doors(&self) -> Vec<Door> {
            Vec::new()
        }

        fn deployment_zone(&self, _zone: DeploymentZone) -> Vec<Position> {
            Vec::new()
        }
    }

    #[test]
    fn path_length_matches_cost() {
        let map = Grid(5);
        let board = BoardState::default();
        let start = Position::new(0, 0);
        let cache = compute_reachable(
            &board,
            &map,
            &FigureKey::new("Trooper", 0, 0),
            start,
            4,
            &MovementProfile::default(),
        );
        let dest = Position::new(3, 2);
        let path = reconstruct_path(&cache, dest).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&dest));
        assert_eq!(path.len() as u8 - 1, cache.cost_of(dest).unwrap());
    }

    #[test]
    fn equal_cost_paths_reconstruct_identically() {
        let map = Grid(5);
        let board = BoardState::default();
        let start = Position::new(0, 0);
        let profile = MovementProfile::default();
        let key = FigureKey::new("Trooper", 0, 0);
        let a = compute_reachable(&board, &map, &key, start, 4, &profile);
        let b = compute_reachable(&board, &map, &key, start, 4, &profile);
        let dest = Position::new(2, 2);
        assert_eq!(reconstruct_path(&a, dest), reconstruct_path(&b, dest));
    }

    #[test]
    fn unreached_destination_yields_none() {
        let map = Grid(3);
        let board = BoardState::default();
        let cache = compute_reachable(
            &board,
            &map,
            &FigureKey::new("Trooper", 0, 0),
            Position::new(0, 0),
            1,
            &MovementProfile::default(),
        );
        assert_eq!(reconstruct_path(&cache, Position::new(2, 2)), None);
    }
}
