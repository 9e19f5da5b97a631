use serde::{Deserialize, Serialize};

use crate::{ConfigError, Evaluation, GameState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base points at session start and after any miss.
    pub base_points_start: u32,
    /// Base points for a level that follows one finished without a miss.
    pub perfect_base_points: u32,
    /// Streak at which the multiplier stops doubling.
    pub max_streak: u32,
    pub iq_start: f64,
    pub iq_min: f64,
    pub iq_max: f64,
    pub iq_failure_penalty: f64,
    pub iq_level_bonus: f64,
    pub iq_speed_factor: f64,
    /// Resets the streak after every matched target instead of only on level completion.
    pub reset_streak_per_target: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_points_start: 5,
            perfect_base_points: 6,
            max_streak: 5,
            iq_start: 100.0,
            iq_min: 70.0,
            iq_max: 200.0,
            iq_failure_penalty: 1.5,
            iq_level_bonus: 4.0,
            iq_speed_factor: 0.1,
            reset_streak_per_target: false,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_streak == 0 {
            return Err(ConfigError::new("scoring.max_streak", "must be positive"));
        }
        if self.base_points_start == 0 || self.perfect_base_points == 0 {
            return Err(ConfigError::new("scoring", "base points must be positive"));
        }
        let values = [
            self.iq_start,
            self.iq_min,
            self.iq_max,
            self.iq_failure_penalty,
            self.iq_level_bonus,
            self.iq_speed_factor,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::new("scoring", "IQ parameters must be finite"));
        }
        if !(self.iq_min..=self.iq_max).contains(&self.iq_start) {
            return Err(ConfigError::new(
                "scoring.iq_start",
                format!("must lie within [{}, {}]", self.iq_min, self.iq_max),
            ));
        }
        Ok(())
    }

    /// Points for a success at `streak` (1-based) with the given base.
    ///
    /// The multiplier doubles per streak step up to `max_streak`.
    ///
    /// ```
    /// use numhex_engine::ScoringConfig;
    ///
    /// let config = ScoringConfig::default();
    /// let points: Vec<_> = (1..=7).map(|s| config.points_for(5, s)).collect();
    /// assert_eq!(points, [5, 10, 20, 40, 80, 80, 80]);
    /// ```
    #[must_use]
    pub fn points_for(&self, base_points: u32, streak: u32) -> u64 {
        let exponent = streak.saturating_sub(1).min(self.max_streak.saturating_sub(1));
        let multiplier = 1_u64.checked_shl(exponent).unwrap_or(u64::MAX);
        u64::from(base_points).saturating_mul(multiplier)
    }
}

/// What a single outcome did to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeReport {
    /// The path completed a target.
    pub matched: bool,
    /// Points added to the total; zero on a miss.
    pub points: u64,
    /// Every target of the level is now completed.
    pub level_completed: bool,
}

/// Applies evaluation outcomes to a [`GameState`].
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Updates streak, score, targets and IQ for one evaluated path.
    ///
    /// A match against an already completed target counts as a miss.
    pub fn apply_outcome(&self, state: &mut GameState, evaluation: Evaluation) -> OutcomeReport {
        match evaluation {
            Evaluation::Matched { target_index, .. } if state.targets.complete(target_index) => {
                self.apply_success(state)
            }
            _ => {
                self.apply_failure(state);
                OutcomeReport {
                    matched: false,
                    points: 0,
                    level_completed: false,
                }
            }
        }
    }

    fn apply_success(&self, state: &mut GameState) -> OutcomeReport {
        let config = &self.config;
        state.streak = state.streak.saturating_add(1).min(config.max_streak);
        let points = config.points_for(state.base_points, state.streak);
        state.total_score = state.total_score.saturating_add(points);

        let level_completed = state.targets.all_completed();
        let mut gain = speed_bonus(points, state.elapsed_secs) * config.iq_speed_factor;
        if level_completed {
            gain += config.iq_level_bonus;
        }
        state.estimated_iq = (state.estimated_iq + gain).clamp(config.iq_min, config.iq_max);

        if config.reset_streak_per_target {
            state.streak = 0;
        }
        OutcomeReport {
            matched: true,
            points,
            level_completed,
        }
    }

    fn apply_failure(&self, state: &mut GameState) {
        let config = &self.config;
        state.streak = 0;
        state.base_points = config.base_points_start;
        state.last_level_perfect = false;
        state.estimated_iq =
            (state.estimated_iq - config.iq_failure_penalty).clamp(config.iq_min, config.iq_max);
    }

    /// Closes a level whose targets are all completed.
    #[expect(clippy::unused_self)]
    pub fn finish_level(&self, state: &mut GameState) {
        state.streak = 0;
        state.level += 1;
    }

    /// Prepares the base points of the level about to start.
    pub fn start_next_level(&self, state: &mut GameState) {
        state.base_points = if state.last_level_perfect {
            self.config.perfect_base_points
        } else {
            self.config.base_points_start
        };
        state.last_level_perfect = true;
        state.streak = 0;
    }
}

#[expect(clippy::cast_precision_loss)]
fn speed_bonus(points: u64, elapsed_secs: u32) -> f64 {
    points as f64 / (f64::from(elapsed_secs) + 1.0)
}
