//! Deterministic rules engine for a two-player tabletop skirmish game.
//!
//! `skirmish-core` owns the canonical rules: the round/phase state machine,
//! grid movement and line of sight, the dice-driven combat pipeline, the
//! scripted ability resolver, and the undo log. It performs no I/O; card
//! stats, map geometry, mission rules, and randomness enter through the
//! oracle traits in [`env`], and all state mutation flows through
//! [`engine::GameEngine`].

pub mod ability;
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod los;
pub mod movement;
pub mod round;
pub mod state;

pub use ability::{AbilityContext, AbilityOutcome, resolve_ability};
pub use action::{Action, ActionOutcome, ActionTransition, OutcomeData, RenderFlags};
pub use combat::{AttackSession, CombatError, CombatPhase};
pub use config::{GameConfig, MatchRules};
pub use engine::{ExecuteError, GameEngine, TransitionPhase, TransitionPhaseError, UndoError};
pub use env::{
    AbilityDef, AbilityEffect, AttackType, CardOracle, CommandCard, DeploymentCard,
    DeploymentZone, Door, GameEnv, MapDimensions, MapOracle, MissionDef, MissionOracle,
    MissionRule, OracleError, PcgRng, RngOracle, SurgeAbility, SurgeEffect, TerrainKind,
    compute_seed,
};
pub use los::{footprints_have_los, has_line_of_sight};
pub use movement::{MoveSession, MovementProfile, compute_reachable, reconstruct_path};
pub use round::GamePhase;
pub use state::{
    BoardState, Condition, ConditionSet, ConfirmKind, DeploymentSlot, FigureHealth, FigureKey,
    Footprint, GameState, Orientation, PendingConfirmation, PlayerState, Position, Side,
    TokenKind, TokenState, UndoEntry, VictoryPoints,
};
