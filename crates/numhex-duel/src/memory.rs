use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_channel::{Receiver, Sender};
use chrono::Utc;

use crate::{
    ChangeKind, DuelMode, MatchChange, MatchGuard, MatchId, MatchPatch, MatchQuery, MatchRecord,
    MatchStore, NewMatch, PlayerId, ProfileRecord, StoreError,
};

/// Store operation a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreOperation {
    #[display("get_profile")]
    GetProfile,
    #[display("insert_profile")]
    InsertProfile,
    #[display("insert_match")]
    InsertMatch,
    #[display("get_match")]
    GetMatch,
    #[display("list_matches")]
    ListMatches,
    #[display("update_match")]
    UpdateMatch,
    #[display("delete_match")]
    DeleteMatch,
}

/// In-process [`MatchStore`].
///
/// Clones share the same tables, so each player can own a handle.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<PlayerId, ProfileRecord>,
    /// Insertion order.
    matches: Vec<MatchRecord>,
    next_id: u64,
    match_feeds: Vec<(MatchId, Sender<MatchChange>)>,
    lobby_feeds: Vec<(DuelMode, Sender<MatchChange>)>,
    failures: HashMap<StoreOperation, StoreError>,
}

impl Tables {
    fn check(&mut self, op: StoreOperation) -> Result<(), StoreError> {
        match self.failures.remove(&op) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn publish(&mut self, kind: ChangeKind, record: &MatchRecord) {
        let change = MatchChange {
            kind,
            id: record.id.clone(),
            mode: record.mode,
            row: record.to_row(),
        };
        self.match_feeds.retain(|(_, tx)| !tx.is_closed());
        self.lobby_feeds.retain(|(_, tx)| !tx.is_closed());
        let match_feeds = self
            .match_feeds
            .iter()
            .filter(|(id, _)| *id == record.id)
            .map(|(_, tx)| tx);
        let lobby_feeds = self
            .lobby_feeds
            .iter()
            .filter(|(mode, _)| *mode == record.mode)
            .map(|(_, tx)| tx);
        for tx in match_feeds.chain(lobby_feeds) {
            // unbounded; fails only once the receiver is gone
            let _ = tx.try_send(change.clone());
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `op` fail with `error`.
    pub fn inject_failure(&self, op: StoreOperation, error: StoreError) {
        self.lock().failures.insert(op, error);
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.lock().matches.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MatchStore for MemoryStore {
    fn get_profile(&self, id: &PlayerId) -> Result<Option<ProfileRecord>, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::GetProfile)?;
        Ok(tables.profiles.get(id).cloned())
    }

    fn insert_profile(&self, profile: ProfileRecord) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::InsertProfile)?;
        tables.profiles.entry(profile.id.clone()).or_insert(profile);
        Ok(())
    }

    fn insert_match(&self, new: NewMatch) -> Result<MatchRecord, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::InsertMatch)?;
        if !tables.profiles.contains_key(&new.player1_id) {
            return Err(StoreError::MissingProfile {
                player: new.player1_id,
            });
        }
        tables.next_id += 1;
        let id = MatchId::new(format!("m-{}", tables.next_id));
        let record = new.into_record(id, Utc::now());
        tables.matches.push(record.clone());
        tables.publish(ChangeKind::Insert, &record);
        log::debug!("match {} hosted by {}", record.id, record.player1_id);
        Ok(record)
    }

    fn get_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::GetMatch)?;
        Ok(tables.matches.iter().find(|m| m.id == *id).cloned())
    }

    fn list_matches(&self, query: &MatchQuery) -> Result<Vec<MatchRecord>, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::ListMatches)?;
        let found = tables
            .matches
            .iter()
            .rev()
            .filter(|m| query.matches(m))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(found)
    }

    fn update_match(
        &self,
        id: &MatchId,
        guard: &MatchGuard,
        patch: &MatchPatch,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::UpdateMatch)?;
        let record = tables
            .matches
            .iter_mut()
            .find(|m| m.id == *id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        if !guard.matches(record) {
            return Ok(None);
        }
        patch.apply(record);
        let record = record.clone();
        tables.publish(ChangeKind::Update, &record);
        Ok(Some(record))
    }

    fn delete_match(&self, id: &MatchId) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        tables.check(StoreOperation::DeleteMatch)?;
        let Some(pos) = tables.matches.iter().position(|m| m.id == *id) else {
            return Ok(false);
        };
        let record = tables.matches.remove(pos);
        tables.publish(ChangeKind::Delete, &record);
        Ok(true)
    }

    fn subscribe_match(&self, id: &MatchId) -> Receiver<MatchChange> {
        let (tx, rx) = async_channel::unbounded();
        self.lock().match_feeds.push((id.clone(), tx));
        rx
    }

    fn subscribe_lobby(&self, mode: DuelMode) -> Receiver<MatchChange> {
        let (tx, rx) = async_channel::unbounded();
        self.lock().lobby_feeds.push((mode, tx));
        rx
    }
}
