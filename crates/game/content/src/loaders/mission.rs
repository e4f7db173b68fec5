//! Mission definition loader.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::MissionDef;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MissionsRon {
    missions: Vec<MissionDef>,
}

/// Loader for mission definitions from RON files.
pub struct MissionLoader;

impl MissionLoader {
    /// Load missions from a RON file, indexed by id.
    pub fn load(path: &Path) -> LoadResult<HashMap<String, MissionDef>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse missions from RON text.
    pub fn parse(content: &str) -> LoadResult<HashMap<String, MissionDef>> {
        let data: MissionsRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse mission RON: {e}"))?;
        Ok(data
            .missions
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::{MissionRule, Position, TokenKind};

    #[test]
    fn parses_rules_and_tokens() {
        let missions = MissionLoader::parse(
            r#"(
                missions: [(
                    id: "smuggling-run",
                    name: "Smuggling Run",
                    tokens: [(Contraband, (x: 3, y: 3))],
                    terminals: [(x: 0, y: 3)],
                    end_of_round: [Delivery(kind: Contraband, zone: "drop", vp: 10)],
                    start_of_round: [],
                    vp_target: Some(30),
                )],
            )"#,
        )
        .unwrap();
        let mission = &missions["smuggling-run"];
        assert_eq!(mission.tokens, vec![(TokenKind::Contraband, Position::new(3, 3))]);
        assert!(matches!(
            mission.end_of_round[0],
            MissionRule::Delivery { vp: 10, .. }
        ));
        assert_eq!(mission.vp_target, Some(30));
    }
}
