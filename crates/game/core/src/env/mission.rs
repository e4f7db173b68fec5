//! Mission rule definitions oracle.

use crate::state::{Position, TokenKind};

/// A data-driven scoring or setup rule evaluated by the round engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissionRule {
    /// The side controlling the named zone (figures present, opponent
    /// absent) scores VP.
    AreaControl { zone: String, vp: u32 },
    /// Each carried or banked token of `kind` scores VP for its holder.
    TokenControl { kind: TokenKind, vp_per_token: u32 },
    /// Tokens of `kind` carried into the named zone are delivered and score.
    Delivery { kind: TokenKind, zone: String, vp: u32 },
    /// The side controlling the panel cell (adjacent figure, no adjacent
    /// enemy) scores VP.
    PanelControl { cell: Position, vp: u32 },
    /// Seed the named counter from the new initiative player's hand size
    /// (start-of-round rule).
    CounterFromHandSize { counter: String },
}

/// A mission: token seeding plus its rule lists.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MissionDef {
    pub id: String,
    pub name: String,
    /// Tokens placed during setup: (kind, cell).
    pub tokens: Vec<(TokenKind, Position)>,
    /// Terminal cells; each controlled terminal adds one status-phase draw.
    pub terminals: Vec<Position>,
    /// Evaluated in order at end of round, before the end-of-round windows.
    pub end_of_round: Vec<MissionRule>,
    /// Evaluated after the round counter increments.
    pub start_of_round: Vec<MissionRule>,
    /// Overrides the default VP target when set.
    pub vp_target: Option<u32>,
}

impl MissionDef {
    /// Documented fallback for unknown mission ids: straight kill-VP
    /// skirmish with no tokens, terminals, or scoring rules.
    pub fn plain_skirmish(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: "Skirmish".to_string(),
            tokens: Vec::new(),
            terminals: Vec::new(),
            end_of_round: Vec::new(),
            start_of_round: Vec::new(),
            vp_target: None,
        }
    }
}

/// Read-only mission lookup.
pub trait MissionOracle: Send + Sync {
    fn mission(&self, id: &str) -> Option<MissionDef>;

    fn mission_or_default(&self, id: &str) -> MissionDef {
        self.mission(id)
            .unwrap_or_else(|| MissionDef::plain_skirmish(id))
    }
}
