use serde::{Deserialize, Serialize};

use crate::GameState;

/// Best results a player has reached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_score: u64,
    pub max_level: u32,
    pub estimated_iq: f64,
}

impl From<&GameState> for PlayerStats {
    fn from(state: &GameState) -> Self {
        Self {
            total_score: state.total_score(),
            max_level: state.level(),
            estimated_iq: state.estimated_iq(),
        }
    }
}

/// Achievement unlocked by reaching a score, level or IQ threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Badge {
    #[display("Rookie")]
    Rookie,
    #[display("Promise")]
    Score1000,
    #[display("Sharp")]
    Iq110,
    #[display("Climber")]
    Level10,
    #[display("Expert")]
    Score5000,
    #[display("Genius")]
    Iq130,
    #[display("Legend")]
    Score10000,
    #[display("Visionary")]
    Iq145,
}

impl Badge {
    pub const ALL: [Self; 8] = [
        Self::Rookie,
        Self::Score1000,
        Self::Iq110,
        Self::Level10,
        Self::Score5000,
        Self::Iq130,
        Self::Score10000,
        Self::Iq145,
    ];

    /// Stable identifier, as stored by the backend.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Rookie => "rookie",
            Self::Score1000 => "score_1000",
            Self::Iq110 => "iq_110",
            Self::Level10 => "level_10",
            Self::Score5000 => "score_5000",
            Self::Iq130 => "iq_130",
            Self::Score10000 => "score_10000",
            Self::Iq145 => "iq_145",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Rookie => "Start the journey. Reach level 2.",
            Self::Score1000 => "Reach 1,000 total points.",
            Self::Iq110 => "Reach an estimated IQ of 110.",
            Self::Level10 => "Reach level 10.",
            Self::Score5000 => "Reach 5,000 total points.",
            Self::Iq130 => "Reach an estimated IQ of 130.",
            Self::Score10000 => "Reach 10,000 total points.",
            Self::Iq145 => "Reach an estimated IQ of 145.",
        }
    }

    #[must_use]
    pub fn is_unlocked(self, stats: &PlayerStats) -> bool {
        match self {
            Self::Rookie => stats.max_level >= 2,
            Self::Level10 => stats.max_level >= 10,
            Self::Score1000 => stats.total_score >= 1000,
            Self::Score5000 => stats.total_score >= 5000,
            Self::Score10000 => stats.total_score >= 10_000,
            Self::Iq110 => stats.estimated_iq >= 110.0,
            Self::Iq130 => stats.estimated_iq >= 130.0,
            Self::Iq145 => stats.estimated_iq >= 145.0,
        }
    }

    /// Badges unlocked by `stats`, in declaration order.
    ///
    /// ```
    /// use numhex_engine::{Badge, PlayerStats};
    ///
    /// let stats = PlayerStats {
    ///     total_score: 1200,
    ///     max_level: 3,
    ///     estimated_iq: 104.0,
    /// };
    /// assert_eq!(Badge::unlocked(&stats), [Badge::Rookie, Badge::Score1000]);
    /// ```
    #[must_use]
    pub fn unlocked(stats: &PlayerStats) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|badge| badge.is_unlocked(stats))
            .collect()
    }
}
