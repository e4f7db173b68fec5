//! Card set loader.
//!
//! A card set RON file holds the deployment cards, command cards, and
//! scripted ability definitions for one content pack. The structs are the
//! core types themselves; the file format is their serde form.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::{AbilityDef, CommandCard, DeploymentCard};

use crate::loaders::{LoadResult, read_file};

/// One content pack's cards, indexed by name/id.
#[derive(Debug, Clone, Default)]
pub struct CardSet {
    pub deployment: HashMap<String, DeploymentCard>,
    pub command: HashMap<String, CommandCard>,
    pub abilities: HashMap<String, AbilityDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CardSetRon {
    #[serde(default)]
    deployment: Vec<DeploymentCard>,
    #[serde(default)]
    command: Vec<CommandCard>,
    #[serde(default)]
    abilities: Vec<AbilityDef>,
}

/// Loader for card data from RON files.
pub struct CardLoader;

impl CardLoader {
    /// Load a card set from a RON file.
    pub fn load(path: &Path) -> LoadResult<CardSet> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a card set from RON text.
    pub fn parse(content: &str) -> LoadResult<CardSet> {
        let data: CardSetRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse card RON: {e}"))?;

        let mut set = CardSet::default();
        for card in data.deployment {
            set.deployment.insert(card.name.clone(), card);
        }
        for card in data.command {
            set.command.insert(card.name.clone(), card);
        }
        for ability in data.abilities {
            set.abilities.insert(ability.id.clone(), ability);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_card_set() {
        let set = CardLoader::parse(
            r#"(
                deployment: [(
                    name: "Stormtrooper",
                    cost: 6,
                    sub_cost: Some(2),
                    figures: 3,
                    health: 3,
                    speed: 4,
                    footprint: Single,
                    attack_type: Ranged,
                    attack_pool: [Blue, Green],
                    defense_pool: [Black],
                    min_range: 1,
                    max_range: 0,
                    surges: [(cost: 1, effect: Damage(1))],
                    specials: [],
                    mobile: false,
                )],
                command: [(
                    name: "Planning",
                    cost: 1,
                    ability: "draw-2",
                    attaches: false,
                )],
                abilities: [(
                    id: "draw-2",
                    effect: Draw(count: 2),
                )],
            )"#,
        )
        .unwrap();
        assert_eq!(set.deployment["Stormtrooper"].figures, 3);
        assert_eq!(set.command["Planning"].ability, "draw-2");
        assert!(set.abilities.contains_key("draw-2"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let set = CardLoader::parse("()").unwrap();
        assert!(set.deployment.is_empty());
        assert!(set.command.is_empty());
    }
}
