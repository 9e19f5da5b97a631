use std::path::Path;

use anyhow::Context as _;
use numhex_duel::DuelConfig;
use numhex_engine::GameConfig;
use serde::{Deserialize, Serialize};

use crate::util;

/// Contents of the `--config` file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub game: GameConfig,
    pub duel: DuelConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config: Self = match path {
            Some(path) => util::read_json_file("config", path)?,
            None => Self::default(),
        };
        config
            .game
            .validate()
            .context("Invalid game configuration")?;
        anyhow::ensure!(config.duel.tick_rate > 0, "duel.tick_rate must be positive");
        anyhow::ensure!(
            config.duel.target_score > 0,
            "duel.target_score must be positive"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use numhex_engine::Topology;

    use super::*;

    #[test]
    fn test_flattened_sections() {
        let config: CliConfig = serde_json::from_str(
            r#"{ "grid": { "topology": "unrestricted" }, "duel": { "launch_delay_ms": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.game.grid.topology, Topology::Unrestricted);
        assert_eq!(config.game.grid.cols, 5);
        assert_eq!(config.duel.launch_delay_ms, 0);
        assert_eq!(config.duel.target_score, 5);
    }

    #[test]
    fn test_default_is_valid() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }
}
