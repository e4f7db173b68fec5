//! Match rule overrides loader (TOML).

use std::path::Path;

use serde::Deserialize;
use skirmish_core::MatchRules;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Deserialize)]
struct RulesToml {
    #[serde(default)]
    vp_target: Option<u32>,
}

/// Loader for optional match rule overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load rule overrides from a TOML file, falling back to defaults for
    /// anything unspecified.
    pub fn load(path: &Path) -> LoadResult<MatchRules> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse rule overrides from TOML text.
    pub fn parse(content: &str) -> LoadResult<MatchRules> {
        let data: RulesToml =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {e}"))?;
        let mut rules = MatchRules::default();
        if let Some(target) = data.vp_target {
            rules.vp_target = target;
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_over_defaults() {
        let rules = ConfigLoader::parse("vp_target = 30\n").unwrap();
        assert_eq!(rules.vp_target, 30);
        let defaults = ConfigLoader::parse("").unwrap();
        assert_eq!(defaults, MatchRules::default());
    }
}
