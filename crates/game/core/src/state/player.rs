//! Per-player state: squad, hand, victory points, activation counters.

use super::figure::{FigureHealth, FigureKey};

/// The two seats of a match. Red always submits first in the setup flow but
/// holds no other privilege; initiative is decided separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Red,
    Blue,
}

impl Default for Side {
    fn default() -> Self {
        Side::Red
    }
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Red, Side::Blue];

    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Red => 0,
            Side::Blue => 1,
        }
    }
}

bitflags::bitflags! {
    /// Harmful and beneficial conditions a figure can carry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ConditionSet: u8 {
        const STUNNED  = 1 << 0;
        const BLEEDING = 1 << 1;
        const WEAKENED = 1 << 2;
        const FOCUSED  = 1 << 3;
        const HIDDEN   = 1 << 4;
    }
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single named condition, used by card effects and surge abilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    Stunned,
    Bleeding,
    Weakened,
    Focused,
    Hidden,
}

impl Condition {
    pub fn flag(self) -> ConditionSet {
        match self {
            Condition::Stunned => ConditionSet::STUNNED,
            Condition::Bleeding => ConditionSet::BLEEDING,
            Condition::Weakened => ConditionSet::WEAKENED,
            Condition::Focused => ConditionSet::FOCUSED,
            Condition::Hidden => ConditionSet::HIDDEN,
        }
    }
}

/// Victory point ledger. `total` is maintained as the sum of the two source
/// buckets; mutation goes through the add helpers so the invariant holds
/// after every change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VictoryPoints {
    pub total: u32,
    pub kills: u32,
    pub objectives: u32,
}

impl VictoryPoints {
    pub fn add_kills(&mut self, amount: u32) {
        self.kills += amount;
        self.total += amount;
    }

    pub fn add_objectives(&mut self, amount: u32) {
        self.objectives += amount;
        self.total += amount;
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.kills + self.objectives
    }
}

/// One deployment card fielded by a squad, owning the health entries of its
/// figures. `group` disambiguates duplicate cards in the same squad.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeploymentSlot {
    pub dc_name: String,
    pub group: u8,
    /// Deployment cost, credited as kill VP when the whole group is defeated
    /// (unless `sub_cost` credits per figure).
    pub cost: u32,
    /// Per-figure kill value for multi-figure cards, when defined.
    pub sub_cost: Option<u32>,
    /// Ordered health entries, one per figure on the card.
    pub figures: Vec<FigureHealth>,
    /// Conditions per figure, parallel to `figures`.
    pub conditions: Vec<ConditionSet>,
    /// Whether this card has spent its activation this round.
    pub activated: bool,
    /// Kill VP already credited for this group (guards double crediting).
    pub vp_credited: bool,
    /// Command cards attached to this deployment card.
    pub attachments: Vec<String>,
}

impl DeploymentSlot {
    pub fn new(dc_name: impl Into<String>, group: u8, cost: u32, sub_cost: Option<u32>, figures: usize, health: u32) -> Self {
        Self {
            dc_name: dc_name.into(),
            group,
            cost,
            sub_cost,
            figures: vec![FigureHealth::full(health); figures],
            conditions: vec![ConditionSet::empty(); figures],
            activated: false,
            vp_credited: false,
            attachments: Vec::new(),
        }
    }

    pub fn figure_key(&self, figure: u8) -> FigureKey {
        FigureKey::new(self.dc_name.clone(), self.group, figure)
    }

    pub fn matches(&self, key: &FigureKey) -> bool {
        self.dc_name == key.dc_name && self.group == key.group
    }

    pub fn health(&self, figure: u8) -> Option<&FigureHealth> {
        self.figures.get(figure as usize)
    }

    pub fn health_mut(&mut self, figure: u8) -> Option<&mut FigureHealth> {
        self.figures.get_mut(figure as usize)
    }

    pub fn is_defeated(&self) -> bool {
        self.figures.iter().all(FigureHealth::is_defeated)
    }

    /// Figures still standing.
    pub fn alive(&self) -> impl Iterator<Item = u8> + '_ {
        self.figures
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_defeated())
            .map(|(i, _)| i as u8)
    }
}

/// Everything one seat owns: identity, squad, command cards, score, and the
/// per-round activation budget.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    /// External identity from the transport layer; opaque to the engine.
    pub user_id: String,
    pub squad_submitted: bool,
    /// Set once by `MarkDeployed`; second attempts are rejected.
    pub deployed: bool,
    pub hand_drawn: bool,
    pub squad: Vec<DeploymentSlot>,
    pub hand: Vec<String>,
    pub deck: Vec<String>,
    pub discard: Vec<String>,
    pub vp: VictoryPoints,
    pub activations_remaining: u8,
    pub activations_total: u8,
    /// Set by "no draw" effects; cleared after the next status phase.
    pub no_status_draw: bool,
}

impl PlayerState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            squad_submitted: false,
            deployed: false,
            hand_drawn: false,
            squad: Vec::new(),
            hand: Vec::new(),
            deck: Vec::new(),
            discard: Vec::new(),
            vp: VictoryPoints::default(),
            activations_remaining: 0,
            activations_total: 0,
            no_status_draw: false,
        }
    }

    pub fn slot(&self, key: &FigureKey) -> Option<&DeploymentSlot> {
        self.squad.iter().find(|s| s.matches(key))
    }

    pub fn slot_mut(&mut self, key: &FigureKey) -> Option<&mut DeploymentSlot> {
        self.squad.iter_mut().find(|s| s.matches(key))
    }

    /// Undefeated deployment cards, i.e. the activation budget for a round.
    pub fn undefeated_cards(&self) -> u8 {
        self.squad.iter().filter(|s| !s.is_defeated()).count() as u8
    }

    /// Removes one copy of `card` from the hand, if present.
    pub fn take_from_hand(&mut self, card: &str) -> Option<String> {
        let index = self.hand.iter().position(|c| c == card)?;
        Some(self.hand.remove(index))
    }

    /// Draws up to `count` cards from the top of the deck into the hand.
    /// Returns how many were actually drawn.
    pub fn draw(&mut self, count: usize) -> usize {
        let drawn = count.min(self.deck.len());
        for _ in 0..drawn {
            let card = self.deck.remove(0);
            self.hand.push(card);
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vp_total_tracks_sources() {
        let mut vp = VictoryPoints::default();
        vp.add_kills(6);
        vp.add_objectives(4);
        assert_eq!(vp.total, 10);
        assert!(vp.is_consistent());
    }

    #[test]
    fn group_defeat_requires_every_figure() {
        let mut slot = DeploymentSlot::new("Stormtrooper", 0, 6, Some(2), 3, 3);
        slot.figures[0].apply_damage(3);
        slot.figures[1].apply_damage(3);
        assert!(!slot.is_defeated());
        slot.figures[2].apply_damage(3);
        assert!(slot.is_defeated());
    }

    #[test]
    fn draw_stops_at_empty_deck() {
        let mut player = PlayerState::new("u1");
        player.deck = vec!["a".into(), "b".into()];
        assert_eq!(player.draw(5), 2);
        assert_eq!(player.hand.len(), 2);
        assert!(player.deck.is_empty());
    }
}
