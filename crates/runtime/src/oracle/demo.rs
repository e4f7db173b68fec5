//! Built-in demonstration content.
//!
//! A small but complete content pack used by tests and local development:
//! five deployment cards covering the footprint and attack-type spread,
//! a command deck exercising every resolver outcome shape, one map with
//! walls, difficult terrain, and a door, and one crate-control mission.

use std::collections::HashMap;

use skirmish_content::{CardSet, MapGeometry};
use skirmish_core::combat::dice::{AttackDie, DefenseDie, RollSide};
use skirmish_core::{
    AbilityDef, AbilityEffect, AttackType, CommandCard, Condition, DeploymentCard, Door, Footprint,
    MapDimensions, MissionDef, MissionRule, Position, SurgeAbility, SurgeEffect, TerrainKind,
    TokenKind,
};

use super::OracleManager;

fn dc(
    name: &str,
    cost: u32,
    sub_cost: Option<u32>,
    figures: u8,
    health: u32,
    speed: u8,
    footprint: Footprint,
    attack_type: AttackType,
    attack_pool: Vec<AttackDie>,
    defense_pool: Vec<DefenseDie>,
    surges: Vec<SurgeAbility>,
    specials: Vec<&str>,
) -> DeploymentCard {
    DeploymentCard {
        name: name.to_string(),
        cost,
        sub_cost,
        figures,
        health,
        speed,
        footprint,
        attack_type,
        attack_pool,
        defense_pool,
        min_range: 1,
        max_range: 0,
        surges,
        specials: specials.into_iter().map(String::from).collect(),
        mobile: false,
    }
}

fn surge(cost: u8, effect: SurgeEffect) -> SurgeAbility {
    SurgeAbility { cost, effect }
}

fn cc(name: &str, cost: u32, ability: &str, attaches: bool) -> CommandCard {
    CommandCard {
        name: name.to_string(),
        cost,
        ability: ability.to_string(),
        attaches,
    }
}

fn ability(id: &str, effect: AbilityEffect) -> AbilityDef {
    AbilityDef {
        id: id.to_string(),
        effect,
    }
}

pub(super) fn build() -> OracleManager {
    let mut cards = CardSet::default();

    for card in [
        dc(
            "Darth Vader",
            18,
            None,
            1,
            16,
            4,
            Footprint::Single,
            AttackType::Melee,
            vec![AttackDie::Red, AttackDie::Red, AttackDie::Yellow],
            vec![DefenseDie::Black],
            vec![surge(1, SurgeEffect::Damage(2)), surge(1, SurgeEffect::Cleave(2))],
            vec!["relentless"],
        ),
        dc(
            "Luke Skywalker",
            16,
            None,
            1,
            12,
            5,
            Footprint::Single,
            AttackType::Melee,
            vec![AttackDie::Red, AttackDie::Green, AttackDie::Yellow],
            vec![DefenseDie::White],
            vec![surge(1, SurgeEffect::Damage(2)), surge(1, SurgeEffect::Recover(1))],
            vec!["deflect"],
        ),
        dc(
            "Stormtrooper",
            6,
            Some(2),
            3,
            3,
            4,
            Footprint::Single,
            AttackType::Ranged,
            vec![AttackDie::Blue, AttackDie::Green],
            vec![DefenseDie::Black],
            vec![surge(1, SurgeEffect::Accuracy(2)), surge(1, SurgeEffect::Damage(1))],
            vec![],
        ),
        dc(
            "Rebel Trooper",
            6,
            Some(3),
            2,
            4,
            4,
            Footprint::Single,
            AttackType::Ranged,
            vec![AttackDie::Blue, AttackDie::Yellow],
            vec![DefenseDie::Black],
            vec![surge(1, SurgeEffect::Damage(1)), surge(2, SurgeEffect::Pierce(2))],
            vec![],
        ),
        dc(
            "AT-ST",
            14,
            None,
            1,
            10,
            3,
            Footprint::Massive,
            AttackType::Ranged,
            vec![AttackDie::Blue, AttackDie::Blue, AttackDie::Yellow],
            vec![DefenseDie::Black],
            vec![surge(1, SurgeEffect::Blast(1)), surge(1, SurgeEffect::Damage(1))],
            vec![],
        ),
    ] {
        cards.deployment.insert(card.name.clone(), card);
    }

    for card in [
        cc("Planning", 1, "planning", false),
        cc("Take Aim", 1, "take-aim", false),
        cc("Urgency", 1, "urgency", false),
        cc("Grenade", 2, "grenade", false),
        cc("Stimulants", 1, "stimulants", false),
        cc("Jammed Comms", 2, "jammed-comms", false),
        cc("Stun Baton", 1, "stun-baton", false),
        cc("Targeting Computer", 2, "targeting-computer", true),
        cc("Element of Surprise", 2, "element-of-surprise", false),
    ] {
        cards.command.insert(card.name.clone(), card);
    }

    for def in [
        ability("planning", AbilityEffect::Draw { count: 2 }),
        ability("take-aim", AbilityEffect::GrantPierce { amount: 2 }),
        ability("urgency", AbilityEffect::GrantMovement { points: 2 }),
        ability(
            "grenade",
            AbilityEffect::DealDamage {
                amount: 2,
                range: 3,
            },
        ),
        ability("stimulants", AbilityEffect::Recover { amount: 3 }),
        ability("jammed-comms", AbilityEffect::BlockStatusDraw),
        ability(
            "stun-baton",
            AbilityEffect::ApplyCondition {
                condition: Condition::Stunned,
                range: 1,
            },
        ),
        // Innate specials referenced by deployment cards.
        ability(
            "relentless",
            AbilityEffect::GrantReroll {
                side: RollSide::Attack,
                count: 1,
            },
        ),
        ability(
            "deflect",
            AbilityEffect::GrantReroll {
                side: RollSide::Defense,
                count: 1,
            },
        ),
        // Timing is genuinely ambiguous; always resolved by the players.
        ability("element-of-surprise", AbilityEffect::Manual),
    ] {
        cards.abilities.insert(def.id.clone(), def);
    }

    let mut maps = HashMap::new();
    maps.insert("training-ground".to_string(), training_ground());

    let mut missions = HashMap::new();
    missions.insert(
        "supply-raid".to_string(),
        MissionDef {
            id: "supply-raid".to_string(),
            name: "Supply Raid".to_string(),
            tokens: vec![
                (TokenKind::Crate, Position::new(4, 3)),
                (TokenKind::Crate, Position::new(5, 6)),
            ],
            terminals: vec![Position::new(0, 4), Position::new(9, 4)],
            end_of_round: vec![MissionRule::TokenControl {
                kind: TokenKind::Crate,
                vp_per_token: 2,
            }],
            start_of_round: vec![],
            vp_target: None,
        },
    );

    OracleManager::new(cards, maps, missions)
}

/// 10x10 practice map: central blocking terrain, flanking difficult ground,
/// a side passage behind a door, deployment rows top and bottom.
fn training_ground() -> MapGeometry {
    let dimensions = MapDimensions::new(10, 10);
    let mut terrain = HashMap::new();
    for y in 0..10 {
        for x in 0..10 {
            terrain.insert(Position::new(x, y), TerrainKind::Open);
        }
    }
    for cell in [
        Position::new(4, 4),
        Position::new(5, 4),
        Position::new(4, 5),
        Position::new(5, 5),
    ] {
        terrain.insert(cell, TerrainKind::Blocking);
    }
    for cell in [Position::new(2, 5), Position::new(7, 4)] {
        terrain.insert(cell, TerrainKind::Difficult);
    }
    terrain.insert(Position::new(8, 5), TerrainKind::Blocking);

    let row = |y: i32| (0..10).map(move |x| Position::new(x, y));

    MapGeometry {
        id: "training-ground".to_string(),
        dimensions,
        terrain,
        doors: vec![Door {
            id: 1,
            cells: vec![Position::new(9, 5)],
        }],
        zone_a: row(0).chain(row(1)).collect(),
        zone_b: row(8).chain(row(9)).collect(),
        named_zones: [(
            "center".to_string(),
            vec![
                Position::new(4, 3),
                Position::new(5, 3),
                Position::new(4, 6),
                Position::new(5, 6),
            ],
        )]
        .into_iter()
        .collect(),
    }
}
