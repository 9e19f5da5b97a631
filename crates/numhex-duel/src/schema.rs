use chrono::{DateTime, Utc};
use numhex_engine::GridSeed;
use serde::{Deserialize, Serialize};

use crate::SchemaError;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[display("pending")]
    Pending,
    #[display("active")]
    Active,
    #[display("finished")]
    Finished,
    #[display("cancelled")]
    Cancelled,
}

impl MatchStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Finished | Self::Cancelled => 2,
        }
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum DuelMode {
    /// Race to a number of completed targets.
    #[default]
    #[display("standard")]
    Standard,
    /// Best of [`DuelMode::BLITZ_ROUNDS`] single-target rounds.
    #[display("blitz")]
    Blitz,
}

impl DuelMode {
    pub const BLITZ_ROUNDS: u32 = 5;

    /// Count a player needs to win a match of this mode.
    #[must_use]
    pub fn win_threshold(self, target_score: u32) -> u32 {
        match self {
            Self::Standard => target_score,
            Self::Blitz => Self::BLITZ_ROUNDS / 2 + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }
}

/// A player's public profile. Matches may only reference existing profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: PlayerId,
    pub username: String,
    pub max_level: u32,
    pub elo_rating: i32,
}

impl ProfileRecord {
    pub const DEFAULT_ELO: i32 = 1000;

    /// Minimal profile created when a player has none yet.
    #[must_use]
    pub fn fallback(id: &PlayerId) -> Self {
        let raw = id.as_str();
        let start = raw.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
        Self {
            id: id.clone(),
            username: format!("player-{}", &raw[start..]),
            max_level: 1,
            elo_rating: Self::DEFAULT_ELO,
        }
    }
}

/// One row of the matches table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub player1_id: PlayerId,
    pub player2_id: Option<PlayerId>,
    pub status: MatchStatus,
    pub winner_id: Option<PlayerId>,
    pub grid_seed: GridSeed,
    pub mode: DuelMode,
    /// Targets completed (standard) or rounds won (blitz) by player 1.
    pub p1_rounds: u32,
    pub p2_rounds: u32,
    pub current_round: u32,
    pub p1_ready: bool,
    pub p2_ready: bool,
    pub target_score: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Parses and validates a row received from a change feed.
    pub fn from_row(row: serde_json::Value) -> Result<Self, SchemaError> {
        let record: Self = serde_json::from_value(row).map_err(|e| SchemaError::Malformed {
            message: e.to_string(),
        })?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let id = || self.id.clone();
        if self.player2_id.as_ref() == Some(&self.player1_id) {
            return Err(SchemaError::SelfMatch { id: id() });
        }
        if self.status.is_active() && self.player2_id.is_none() {
            return Err(SchemaError::MissingOpponent { id: id() });
        }
        match (&self.winner_id, self.status) {
            (None, MatchStatus::Finished) => Err(SchemaError::MissingWinner { id: id() }),
            (Some(winner), _) if self.seat(winner).is_none() => {
                Err(SchemaError::ForeignWinner { id: id() })
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn to_row(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    #[must_use]
    pub fn seat(&self, player: &PlayerId) -> Option<Seat> {
        if *player == self.player1_id {
            Some(Seat::Player1)
        } else if self.player2_id.as_ref() == Some(player) {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&PlayerId> {
        match seat {
            Seat::Player1 => Some(&self.player1_id),
            Seat::Player2 => self.player2_id.as_ref(),
        }
    }

    #[must_use]
    pub fn rounds(&self, seat: Seat) -> u32 {
        match seat {
            Seat::Player1 => self.p1_rounds,
            Seat::Player2 => self.p2_rounds,
        }
    }

    #[must_use]
    pub fn is_ready(&self, seat: Seat) -> bool {
        match seat {
            Seat::Player1 => self.p1_ready,
            Seat::Player2 => self.p2_ready,
        }
    }

    #[must_use]
    pub fn both_ready(&self) -> bool {
        self.p1_ready && self.p2_ready
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_pending() && self.player2_id.is_none()
    }

    #[must_use]
    pub fn win_threshold(&self) -> u32 {
        self.mode.win_threshold(self.target_score)
    }

    /// Monotonic progress marker used to drop out-of-order feed rows.
    ///
    /// Status, round and scores never go back; ready flags only reset when
    /// the round advances.
    #[must_use]
    pub fn progress(&self) -> (u8, u32, u32, u8) {
        (
            self.status.rank(),
            self.current_round,
            self.p1_rounds + self.p2_rounds,
            u8::from(self.p1_ready) + u8::from(self.p2_ready),
        )
    }
}

/// Values for a freshly hosted match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub player1_id: PlayerId,
    pub grid_seed: GridSeed,
    pub mode: DuelMode,
    pub target_score: u32,
}

impl NewMatch {
    #[must_use]
    pub fn into_record(self, id: MatchId, created_at: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            id,
            player1_id: self.player1_id,
            player2_id: None,
            status: MatchStatus::Pending,
            winner_id: None,
            grid_seed: self.grid_seed,
            mode: self.mode,
            p1_rounds: 0,
            p2_rounds: 0,
            current_round: 1,
            p1_ready: false,
            p2_ready: false,
            target_score: self.target_score,
            created_at,
            finished_at: None,
        }
    }
}

/// Columns written by one update. `None` leaves a column untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchPatch {
    pub player2_id: Option<PlayerId>,
    pub status: Option<MatchStatus>,
    pub winner_id: Option<PlayerId>,
    pub p1_rounds: Option<u32>,
    pub p2_rounds: Option<u32>,
    pub current_round: Option<u32>,
    pub p1_ready: Option<bool>,
    pub p2_ready: Option<bool>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MatchPatch {
    #[must_use]
    pub fn join(player: PlayerId) -> Self {
        Self {
            player2_id: Some(player),
            status: Some(MatchStatus::Active),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn finish(winner: PlayerId, at: DateTime<Utc>) -> Self {
        Self::default().with_finish(winner, at)
    }

    #[must_use]
    pub fn cancel() -> Self {
        Self {
            status: Some(MatchStatus::Cancelled),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_finish(mut self, winner: PlayerId, at: DateTime<Utc>) -> Self {
        self.status = Some(MatchStatus::Finished);
        self.winner_id = Some(winner);
        self.finished_at = Some(at);
        self
    }

    #[must_use]
    pub fn with_rounds(mut self, seat: Seat, rounds: u32) -> Self {
        match seat {
            Seat::Player1 => self.p1_rounds = Some(rounds),
            Seat::Player2 => self.p2_rounds = Some(rounds),
        }
        self
    }

    #[must_use]
    pub fn with_ready(mut self, seat: Seat, ready: bool) -> Self {
        match seat {
            Seat::Player1 => self.p1_ready = Some(ready),
            Seat::Player2 => self.p2_ready = Some(ready),
        }
        self
    }

    /// Moves to `round` and clears both ready flags.
    #[must_use]
    pub fn with_round(mut self, round: u32) -> Self {
        self.current_round = Some(round);
        self.p1_ready = Some(false);
        self.p2_ready = Some(false);
        self
    }

    pub fn apply(&self, record: &mut MatchRecord) {
        fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }

        if let Some(player) = &self.player2_id {
            record.player2_id = Some(player.clone());
        }
        if let Some(winner) = &self.winner_id {
            record.winner_id = Some(winner.clone());
        }
        if let Some(at) = self.finished_at {
            record.finished_at = Some(at);
        }
        set(&mut record.status, self.status.as_ref());
        set(&mut record.p1_rounds, self.p1_rounds.as_ref());
        set(&mut record.p2_rounds, self.p2_rounds.as_ref());
        set(&mut record.current_round, self.current_round.as_ref());
        set(&mut record.p1_ready, self.p1_ready.as_ref());
        set(&mut record.p2_ready, self.p2_ready.as_ref());
    }
}

/// Conditions a row must meet for an update to apply.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchGuard {
    /// Allowed statuses; empty allows any.
    pub statuses: Vec<MatchStatus>,
    pub player2_absent: bool,
    pub current_round: Option<u32>,
}

impl MatchGuard {
    /// Pending with no second player yet.
    #[must_use]
    pub fn open() -> Self {
        Self {
            statuses: vec![MatchStatus::Pending],
            player2_absent: true,
            current_round: None,
        }
    }

    #[must_use]
    pub fn status(status: MatchStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_round(mut self, round: u32) -> Self {
        self.current_round = Some(round);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &MatchRecord) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&record.status))
            && (!self.player2_absent || record.player2_id.is_none())
            && self.current_round.is_none_or(|round| round == record.current_round)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row() -> serde_json::Value {
        json!({
            "id": "m-1",
            "player1_id": "alice",
            "player2_id": "bob",
            "status": "active",
            "winner_id": null,
            "grid_seed": "000000000000000000000000000000ff",
            "mode": "blitz",
            "p1_rounds": 1,
            "p2_rounds": 2,
            "current_round": 4,
            "p1_ready": true,
            "p2_ready": false,
            "target_score": 5,
            "created_at": "2025-01-01T00:00:00Z",
        })
    }

    mod rows {
        use super::*;

        #[test]
        fn test_valid_row() {
            let record = MatchRecord::from_row(row()).unwrap();
            assert_eq!(record.mode, DuelMode::Blitz);
            assert_eq!(record.status, MatchStatus::Active);
            assert_eq!(record.grid_seed.as_u128(), 0xff);
            assert_eq!(record.seat(&PlayerId::new("bob")), Some(Seat::Player2));
            assert_eq!(record.finished_at, None);
            assert_eq!(record.to_row()["mode"], "blitz");
        }

        #[test]
        fn test_active_without_opponent() {
            let mut row = row();
            row["player2_id"] = json!(null);
            assert!(matches!(
                MatchRecord::from_row(row),
                Err(SchemaError::MissingOpponent { .. })
            ));
        }

        #[test]
        fn test_self_match() {
            let mut row = row();
            row["player2_id"] = json!("alice");
            assert!(matches!(
                MatchRecord::from_row(row),
                Err(SchemaError::SelfMatch { .. })
            ));
        }

        #[test]
        fn test_finished_winner_must_be_playing() {
            let mut row = row();
            row["status"] = json!("finished");
            assert!(matches!(
                MatchRecord::from_row(row.clone()),
                Err(SchemaError::MissingWinner { .. })
            ));
            row["winner_id"] = json!("carol");
            assert!(matches!(
                MatchRecord::from_row(row.clone()),
                Err(SchemaError::ForeignWinner { .. })
            ));
            row["winner_id"] = json!("bob");
            assert!(MatchRecord::from_row(row).is_ok());
        }

        #[test]
        fn test_unknown_mode() {
            let mut row = row();
            row["mode"] = json!("Blitz");
            assert!(matches!(
                MatchRecord::from_row(row),
                Err(SchemaError::Malformed { .. })
            ));
        }
    }

    mod updates {
        use super::*;

        #[test]
        fn test_guard() {
            let record = MatchRecord::from_row(row()).unwrap();
            assert!(!MatchGuard::open().matches(&record));
            assert!(MatchGuard::status(MatchStatus::Active).matches(&record));
            assert!(
                MatchGuard::status(MatchStatus::Active)
                    .at_round(4)
                    .matches(&record)
            );
            assert!(
                !MatchGuard::status(MatchStatus::Active)
                    .at_round(3)
                    .matches(&record)
            );
            assert!(MatchGuard::default().matches(&record));
        }

        #[test]
        fn test_patch() {
            let mut record = MatchRecord::from_row(row()).unwrap();
            MatchPatch::default()
                .with_rounds(Seat::Player2, 3)
                .with_round(5)
                .apply(&mut record);
            assert_eq!(record.p2_rounds, 3);
            assert_eq!(record.p1_rounds, 1);
            assert_eq!(record.current_round, 5);
            assert!(!record.p1_ready && !record.p2_ready);

            let at = record.created_at;
            MatchPatch::finish(PlayerId::new("bob"), at).apply(&mut record);
            assert_eq!(record.status, MatchStatus::Finished);
            assert_eq!(record.winner_id, Some(PlayerId::new("bob")));
            assert_eq!(record.finished_at, Some(at));
            assert!(record.validate().is_ok());
        }

        #[test]
        fn test_progress_orders_updates() {
            let before = MatchRecord::from_row(row()).unwrap();
            let mut after = before.clone();
            MatchPatch::default()
                .with_rounds(Seat::Player1, 2)
                .with_round(5)
                .apply(&mut after);
            assert!(after.progress() > before.progress());
        }
    }

    #[test]
    fn test_blitz_threshold() {
        assert_eq!(DuelMode::Blitz.win_threshold(5), 3);
        assert_eq!(DuelMode::Standard.win_threshold(5), 5);
    }

    #[test]
    fn test_fallback_profile() {
        let profile = ProfileRecord::fallback(&PlayerId::new("user-12345678"));
        assert_eq!(profile.username, "player-5678");
        assert_eq!(profile.max_level, 1);
        assert_eq!(profile.elo_rating, 1000);
    }
}
