//! Card stats oracle: deployment cards, command cards, and scripted ability
//! definitions.

use crate::combat::dice::{AttackDie, DefenseDie, RollSide};
use crate::state::{Condition, Footprint, TokenKind};

/// How an attack measures range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackType {
    Melee,
    Ranged,
}

/// One spendable surge conversion printed on a deployment card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurgeAbility {
    /// Surge results consumed.
    pub cost: u8,
    pub effect: SurgeEffect,
}

/// What a spent surge converts into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurgeEffect {
    Damage(u8),
    Pierce(u8),
    Accuracy(u8),
    Condition(Condition),
    Blast(u8),
    Recover(u8),
    Cleave(u8),
}

/// Static stats of a deployment card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeploymentCard {
    pub name: String,
    /// Deployment point cost; also the kill VP for wiping the group.
    pub cost: u32,
    /// Kill VP per figure for multi-figure cards, when defined.
    pub sub_cost: Option<u32>,
    pub figures: u8,
    pub health: u32,
    pub speed: u8,
    pub footprint: Footprint,
    pub attack_type: AttackType,
    pub attack_pool: Vec<AttackDie>,
    pub defense_pool: Vec<DefenseDie>,
    pub min_range: u8,
    pub max_range: u8,
    pub surges: Vec<SurgeAbility>,
    /// Ability ids of innate specials (rerolls, cleave, movement tricks).
    pub specials: Vec<String>,
    /// Ignores difficult terrain while moving.
    pub mobile: bool,
}

impl DeploymentCard {
    /// Documented fallback for unknown card names: one fragile melee figure
    /// with no specials. Keeps a match playable when a squad references data
    /// the content pack lacks.
    pub fn unknown(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cost: 0,
            sub_cost: None,
            figures: 1,
            health: 1,
            speed: 4,
            footprint: Footprint::Single,
            attack_type: AttackType::Melee,
            attack_pool: Vec::new(),
            defense_pool: Vec::new(),
            min_range: 1,
            max_range: 1,
            surges: Vec::new(),
            specials: Vec::new(),
            mobile: false,
        }
    }
}

/// Static stats of a command card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandCard {
    pub name: String,
    /// Command point cost for deck building.
    pub cost: u32,
    /// Ability id resolved when the card is played.
    pub ability: String,
    /// Whether the card attaches to a deployment card instead of resolving
    /// immediately.
    pub attaches: bool,
}

/// A scripted ability: id plus the data-driven effect the resolver applies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDef {
    pub id: String,
    pub effect: AbilityEffect,
}

/// The effect vocabulary the resolver can apply automatically. Anything a
/// card does that fits none of these is declared `Manual` and resolved by
/// the players.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffect {
    /// Deal damage to a chosen figure within range of the source figure.
    DealDamage { amount: u32, range: u8 },
    /// Recover health on a chosen friendly figure.
    Recover { amount: u32 },
    /// Draw command cards.
    Draw { count: u8 },
    /// Gain objective VP.
    GainVp { amount: u32 },
    /// Apply a condition to a chosen enemy figure within range.
    ApplyCondition { condition: Condition, range: u8 },
    /// Remove a condition from a chosen friendly figure.
    RemoveCondition { condition: Condition },
    /// Grant movement points to a figure of the current activation.
    GrantMovement { points: u8 },
    /// Add dice to the pending attack's pool (pre-combat window).
    GrantAttackDice { dice: Vec<AttackDie> },
    /// Add dice to the pending defense pool (pre-combat window).
    GrantDefenseDice { dice: Vec<DefenseDie> },
    /// Add pierce to the pending attack.
    GrantPierce { amount: u8 },
    /// Add accuracy to the pending attack.
    GrantAccuracy { amount: u8 },
    /// Grant rerolls for the pending attack.
    GrantReroll { side: RollSide, count: u8 },
    /// Grant bonus surge to the pending attack.
    GrantSurge { amount: u8 },
    /// The opponent skips their next status-phase draw.
    BlockStatusDraw,
    /// Place a mission token on a chosen free cell of a named zone.
    PlaceToken { kind: TokenKind, zone: String },
    /// Cannot be auto-resolved; surfaced to the players.
    Manual,
}

/// Read-only card data lookup.
pub trait CardOracle: Send + Sync {
    fn deployment_card(&self, name: &str) -> Option<DeploymentCard>;
    fn command_card(&self, name: &str) -> Option<CommandCard>;
    fn ability(&self, id: &str) -> Option<AbilityDef>;

    /// Lookup with the documented unknown-card fallback.
    fn deployment_card_or_default(&self, name: &str) -> DeploymentCard {
        self.deployment_card(name)
            .unwrap_or_else(|| DeploymentCard::unknown(name))
    }
}
