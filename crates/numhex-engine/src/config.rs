//! Game configuration.
//!
//! Every field has a default, so a configuration file only needs to list the
//! values it changes:
//!
//! ```
//! use numhex_engine::{GameConfig, Topology};
//!
//! let config: GameConfig =
//!     serde_json::from_str(r#"{ "grid": { "topology": "rectilinear" } }"#).unwrap();
//! assert_eq!(config.grid.topology, Topology::Rectilinear);
//! assert_eq!(config.grid.rows, 7);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ScoringConfig, Topology};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub targets: TargetConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u8,
    pub cols: u8,
    pub topology: Topology,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 7,
            cols: 5,
            topology: Topology::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Number of distinct targets per level.
    pub count: usize,
    /// Upper bound of the first operand used to build a target.
    pub first_operand_max: u32,
    /// Upper bound of the second operand used to build a target.
    pub second_operand_max: u32,
    /// Sampling attempts before falling back to default targets.
    pub max_attempts: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            count: 5,
            first_operand_max: 15,
            second_operand_max: 10,
            max_attempts: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown at the start of a session. Unspent time carries over between levels.
    pub initial_time_secs: u32,
    /// Controller ticks per second.
    pub tick_rate: u32,
    /// Input lock between the final target of a level and the level-complete screen.
    pub victory_delay_ms: u32,
    /// Pre-generated levels kept ready.
    pub level_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_time_secs: 60,
            tick_rate: 60,
            victory_delay_ms: 1200,
            level_buffer_size: 2,
        }
    }
}

impl SessionConfig {
    /// Converts a delay into a tick count, rounding up.
    #[must_use]
    pub fn ticks_for_millis(&self, millis: u32) -> u64 {
        (u64::from(millis) * u64::from(self.tick_rate)).div_ceil(1000)
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GridConfig { rows, cols, .. } = self.grid;
        if rows == 0 || cols == 0 {
            return Err(ConfigError::new("grid", "must have at least one row and column"));
        }
        if usize::from(rows) * usize::from(cols) < 3 {
            return Err(ConfigError::new("grid", "must hold at least three cells"));
        }
        if self.targets.count == 0 {
            return Err(ConfigError::new("targets.count", "must be positive"));
        }
        if self.targets.first_operand_max == 0 || self.targets.second_operand_max == 0 {
            return Err(ConfigError::new("targets", "operand bounds must be positive"));
        }
        if self.session.tick_rate == 0 {
            return Err(ConfigError::new("session.tick_rate", "must be positive"));
        }
        if self.session.initial_time_secs == 0 {
            return Err(ConfigError::new(
                "session.initial_time_secs",
                "must be positive",
            ));
        }
        self.scoring.validate()
    }
}
