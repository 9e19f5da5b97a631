use crate::{LevelTargets, ScoringConfig};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum SessionStatus {
    #[default]
    #[display("idle")]
    Idle,
    #[display("playing")]
    Playing,
    #[display("level complete")]
    LevelComplete,
    #[display("game over")]
    GameOver,
}

/// Progress of a single-player session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub(crate) total_score: u64,
    pub(crate) streak: u32,
    pub(crate) level: u32,
    pub(crate) time_left: u32,
    pub(crate) elapsed_secs: u32,
    pub(crate) status: SessionStatus,
    pub(crate) estimated_iq: f64,
    pub(crate) last_level_perfect: bool,
    pub(crate) base_points: u32,
    pub(crate) targets: LevelTargets,
}

impl GameState {
    /// Creates the state of a session that has not started yet.
    #[must_use]
    pub fn new(scoring: &ScoringConfig, initial_time_secs: u32) -> Self {
        Self {
            total_score: 0,
            streak: 0,
            level: 1,
            time_left: initial_time_secs,
            elapsed_secs: 0,
            status: SessionStatus::Idle,
            estimated_iq: scoring.iq_start,
            last_level_perfect: true,
            base_points: scoring.base_points_start,
            targets: LevelTargets::default(),
        }
    }

    #[must_use]
    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Seconds left on the session countdown.
    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Seconds played since the session started.
    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn estimated_iq(&self) -> f64 {
        self.estimated_iq
    }

    #[must_use]
    pub fn last_level_perfect(&self) -> bool {
        self.last_level_perfect
    }

    #[must_use]
    pub fn base_points(&self) -> u32 {
        self.base_points
    }

    #[must_use]
    pub fn level_targets(&self) -> &LevelTargets {
        &self.targets
    }
}
