//! Compile-time rule constants shared across the engine.

/// Fixed rule parameters for a skirmish match.
///
/// These are the tournament-standard values. Content packs that want house
/// rules override the per-match copies on [`MatchRules`], not the constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig;

impl GameConfig {
    /// Actions each figure of an activated deployment card may spend.
    pub const ACTIONS_PER_ACTIVATION: u8 = 2;

    /// Command cards drawn when building the starting hand.
    pub const STARTING_HAND: usize = 3;

    /// Base command cards drawn in the status phase (before terminal bonuses).
    pub const BASE_STATUS_DRAW: usize = 1;

    /// Victory points required to win.
    pub const VP_TARGET: u32 = 40;

    /// Deployment point budget for a legal squad.
    pub const SQUAD_POINT_LIMIT: u32 = 40;

    /// Command point budget for a legal command deck.
    pub const COMMAND_POINT_LIMIT: u32 = 15;

    /// Maximum command cards in a deck.
    pub const COMMAND_CARD_LIMIT: usize = 15;

    /// Seconds before a pending confirmation expires and must be re-initiated.
    pub const CONFIRMATION_TTL_SECS: u64 = 300;

    /// Largest footprint supported (2x3 massive figures).
    pub const MAX_FOOTPRINT_CELLS: usize = 6;
}

/// Per-match rule overrides resolved at setup from mission data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchRules {
    /// Victory point target for this match.
    pub vp_target: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            vp_target: GameConfig::VP_TARGET,
        }
    }
}
