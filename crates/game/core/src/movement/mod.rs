//! Movement engine: reachability, exact-cost destination selection, and
//! banked movement-point sessions.
//!
//! Players commit a distance first and then pick a destination at exactly
//! that cost. Unused movement points bank across multiple Move actions
//! within one activation, so the reachability cache is recomputed whenever
//! the budget grows or the figure moves partway and continues.

mod path;
mod reach;

pub use path::reconstruct_path;
pub use reach::{ReachCache, compute_reachable, displacement_cell};

use crate::state::{FigureKey, Footprint, Orientation, Position};

/// Everything about a figure that affects where it can go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementProfile {
    pub footprint: Footprint,
    pub orientation: Orientation,
    /// Ignores difficult terrain surcharges.
    pub mobile: bool,
    /// Displaces a smaller occupying figure on arrival.
    pub massive: bool,
}

/// Transient per-figure movement session. Lives on the game record while a
/// figure is spending movement points; destroyed when the points reach zero
/// or the activation ends.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveSession {
    pub figure: FigureKey,
    /// Banked movement points remaining.
    pub mp: u8,
    /// Distance the player committed to, awaiting a destination choice.
    pub pending_distance: Option<u8>,
    /// Reachability cache; recomputable, so never persisted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cache: Option<ReachCache>,
}

impl MoveSession {
    pub fn new(figure: FigureKey) -> Self {
        Self {
            figure,
            mp: 0,
            pending_distance: None,
            cache: None,
        }
    }

    /// Adds banked movement points and invalidates the cache (the reachable
    /// set grows with the budget).
    pub fn add_points(&mut self, points: u8) {
        self.mp = self.mp.saturating_add(points);
        self.cache = None;
    }

    /// Whether the cached reachability is still valid for this start cell
    /// and budget.
    pub fn cache_is_fresh(&self, start: Position, profile: &MovementProfile) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.start == start && c.budget == self.mp && c.profile == *profile)
    }
}
