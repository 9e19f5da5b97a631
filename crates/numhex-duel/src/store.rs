use async_channel::Receiver;

use crate::{
    DuelMode, MatchGuard, MatchId, MatchPatch, MatchRecord, MatchStatus, NewMatch, PlayerId,
    ProfileRecord, StoreError,
};

/// Filter for [`MatchStore::list_matches`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    /// Allowed statuses; empty allows any.
    pub statuses: Vec<MatchStatus>,
    pub mode: Option<DuelMode>,
    /// Only matches this player takes part in.
    pub player: Option<PlayerId>,
    /// Only matches still waiting for a second player.
    pub open_only: bool,
    pub limit: Option<usize>,
}

impl MatchQuery {
    #[must_use]
    pub fn matches(&self, record: &MatchRecord) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&record.status))
            && self.mode.is_none_or(|mode| mode == record.mode)
            && self
                .player
                .as_ref()
                .is_none_or(|player| record.seat(player).is_some())
            && (!self.open_only || record.player2_id.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum ChangeKind {
    #[display("insert")]
    Insert,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
}

/// One row change pushed to subscribers.
///
/// `row` is the raw row after the change, or the last row for a delete.
/// Subscribers validate it with [`MatchRecord::from_row`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchChange {
    pub kind: ChangeKind,
    pub id: MatchId,
    pub mode: DuelMode,
    pub row: serde_json::Value,
}

/// Shared storage for profiles and matches.
///
/// Every write targets a single row. Updates carry a [`MatchGuard`] and only
/// apply when the stored row still satisfies it, which is what settles
/// races between the two players.
pub trait MatchStore {
    fn get_profile(&self, id: &PlayerId) -> Result<Option<ProfileRecord>, StoreError>;

    fn insert_profile(&self, profile: ProfileRecord) -> Result<(), StoreError>;

    /// Inserts a pending match. Fails with [`StoreError::MissingProfile`]
    /// when the host has no profile.
    fn insert_match(&self, new: NewMatch) -> Result<MatchRecord, StoreError>;

    fn get_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, StoreError>;

    /// Matching rows, newest first.
    fn list_matches(&self, query: &MatchQuery) -> Result<Vec<MatchRecord>, StoreError>;

    /// Applies `patch` if the row satisfies `guard`.
    ///
    /// Returns the updated row, or `None` when the guard rejected the update.
    fn update_match(
        &self,
        id: &MatchId,
        guard: &MatchGuard,
        patch: &MatchPatch,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Returns whether a row was deleted.
    fn delete_match(&self, id: &MatchId) -> Result<bool, StoreError>;

    /// Changes of a single match.
    fn subscribe_match(&self, id: &MatchId) -> Receiver<MatchChange>;

    /// Changes of every match of `mode`.
    fn subscribe_lobby(&self, mode: DuelMode) -> Receiver<MatchChange>;
}
