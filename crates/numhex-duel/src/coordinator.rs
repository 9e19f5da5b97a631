use std::{iter, mem};

use async_channel::Receiver;
use chrono::Utc;
use numhex_engine::GridSeed;
use serde::{Deserialize, Serialize};

use crate::{
    DuelError, DuelMode, MatchChange, MatchGuard, MatchId, MatchPatch, MatchQuery, MatchRecord,
    MatchStatus, MatchStore, NewMatch, PlayerId, ProfileRecord, Seat, StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Targets a standard-mode player must complete to win.
    pub target_score: u32,
    /// Pause between both players being ready and the round starting.
    pub launch_delay_ms: u32,
    /// Coordinator ticks per second.
    pub tick_rate: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            target_score: 5,
            launch_delay_ms: 1500,
            tick_rate: 60,
        }
    }
}

impl DuelConfig {
    #[must_use]
    pub fn launch_ticks(&self) -> u64 {
        (u64::from(self.launch_delay_ms) * u64::from(self.tick_rate)).div_ceil(1000)
    }
}

/// Result of a finished match from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelOutcome {
    pub won: bool,
    /// The winner never reached the mode's threshold: the opponent left.
    pub abandonment: bool,
    pub mine: u32,
    pub theirs: u32,
}

/// Classifies a finished match for `me`.
///
/// Returns `None` unless the match is finished and `me` played in it.
#[must_use]
pub fn classify(record: &MatchRecord, me: &PlayerId) -> Option<DuelOutcome> {
    if !record.status.is_finished() {
        return None;
    }
    let my_seat = record.seat(me)?;
    let winner = record.winner_id.as_ref()?;
    let winner_seat = record.seat(winner)?;
    Some(DuelOutcome {
        won: winner == me,
        abandonment: record.rounds(winner_seat) < record.win_threshold(),
        mine: record.rounds(my_seat),
        theirs: record.rounds(my_seat.other()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum JoinOutcome {
    Joined(MatchRecord),
    /// Taken by someone else, cancelled, or hosted by the caller.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum DuelEvent {
    MatchStarted { opponent: PlayerId },
    OpponentReady,
    BothReady { round: u32 },
    /// Launch delay elapsed; play `round` on the grid derived from `seed`.
    LaunchRound { round: u32, seed: GridSeed },
    ScoreChanged { mine: u32, theirs: u32 },
    RoundAdvanced { round: u32 },
    Finished(DuelOutcome),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingLaunch {
    round: u32,
    seed: GridSeed,
    ticks_left: u64,
}

/// One player's side of a duel.
///
/// Every write is a single guarded update of the match row, so both players
/// can act at the same time and the store decides who got there first. The
/// other player's writes arrive through the match feed and are turned into
/// [`DuelEvent`]s by [`DuelCoordinator::poll`].
#[derive(Debug)]
pub struct DuelCoordinator<S> {
    store: S,
    me: PlayerId,
    config: DuelConfig,
    current: Option<MatchRecord>,
    feed: Option<Receiver<MatchChange>>,
    launch: Option<PendingLaunch>,
    events: Vec<DuelEvent>,
}

impl<S: MatchStore> DuelCoordinator<S> {
    #[must_use]
    pub fn new(store: S, me: PlayerId, config: DuelConfig) -> Self {
        Self {
            store,
            me,
            config,
            current: None,
            feed: None,
            launch: None,
            events: vec![],
        }
    }

    #[must_use]
    pub fn me(&self) -> &PlayerId {
        &self.me
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn current(&self) -> Option<&MatchRecord> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn seat(&self) -> Option<Seat> {
        self.current.as_ref()?.seat(&self.me)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<DuelOutcome> {
        classify(self.current.as_ref()?, &self.me)
    }

    #[must_use]
    pub fn is_launching(&self) -> bool {
        self.launch.is_some()
    }

    #[must_use]
    pub fn lobby_feed(&self, mode: DuelMode) -> Receiver<MatchChange> {
        self.store.subscribe_lobby(mode)
    }

    /// Opens a new pending match hosted by this player.
    ///
    /// Stale unfinished matches of this player are closed first. A missing
    /// profile is created once before giving up.
    pub fn host(&mut self, mode: DuelMode, seed: GridSeed) -> Result<MatchRecord, DuelError> {
        self.detach();
        self.close_stale()?;
        let new = NewMatch {
            player1_id: self.me.clone(),
            grid_seed: seed,
            mode,
            target_score: self.config.target_score,
        };
        let record = match self.store.insert_match(new.clone()) {
            Err(StoreError::MissingProfile { .. }) => {
                self.create_profile()?;
                self.store.insert_match(new)?
            }
            result => result?,
        };
        log::info!("hosting {mode} match {}", record.id);
        self.feed = Some(self.store.subscribe_match(&record.id));
        self.current = Some(record.clone());
        // a join may land before the subscription; the feed catches up
        // with later changes if this read fails
        if let Err(e) = self.refresh() {
            log::warn!("cannot re-read hosted match {}: {e}", record.id);
        }
        Ok(record)
    }

    /// Open matches of `mode` hosted by other players, newest first.
    pub fn open_matches(&self, mode: DuelMode) -> Result<Vec<MatchRecord>, DuelError> {
        let query = MatchQuery {
            statuses: vec![MatchStatus::Pending],
            mode: Some(mode),
            open_only: true,
            ..MatchQuery::default()
        };
        let found = self.store.list_matches(&query)?;
        Ok(found
            .into_iter()
            .filter(|record| record.player1_id != self.me)
            .collect())
    }

    /// Takes the second seat of an open match.
    ///
    /// The seat is claimed by one conditional update, so of several players
    /// joining at once exactly one gets [`JoinOutcome::Joined`].
    pub fn join(&mut self, id: &MatchId) -> Result<JoinOutcome, DuelError> {
        self.detach();
        self.close_stale()?;
        match self.store.get_match(id)? {
            Some(record) if record.player1_id != self.me => {}
            _ => return Ok(JoinOutcome::Unavailable),
        }
        let feed = self.store.subscribe_match(id);
        let patch = MatchPatch::join(self.me.clone());
        let joined = match self.store.update_match(id, &MatchGuard::open(), &patch) {
            Ok(joined) => joined,
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let Some(record) = joined else {
            log::info!("match {id} is no longer open");
            return Ok(JoinOutcome::Unavailable);
        };
        log::info!("joined match {id} against {}", record.player1_id);
        self.feed = Some(feed);
        self.events.push(DuelEvent::MatchStarted {
            opponent: record.player1_id.clone(),
        });
        self.arm_launch(&record);
        self.current = Some(record.clone());
        Ok(JoinOutcome::Joined(record))
    }

    /// Deletes the hosted match while nobody has joined it.
    ///
    /// Returns `false` when an opponent joined first; the match then
    /// continues as usual.
    pub fn cancel_hosting(&mut self) -> Result<bool, DuelError> {
        let id = match &self.current {
            Some(record) if record.player1_id == self.me => record.id.clone(),
            _ => return Err(DuelError::NotInMatch),
        };
        if self
            .store
            .update_match(&id, &MatchGuard::open(), &MatchPatch::cancel())?
            .is_none()
        {
            self.refresh()?;
            return Ok(false);
        }
        self.store.delete_match(&id)?;
        log::info!("cancelled match {id}");
        self.detach();
        Ok(true)
    }

    /// Marks this player ready for the current round.
    ///
    /// Returns `false` if the round moved on before the flag was written.
    pub fn set_ready(&mut self) -> Result<bool, DuelError> {
        let (record, seat) = self.position()?;
        let guard = MatchGuard::status(MatchStatus::Active).at_round(record.current_round);
        let patch = MatchPatch::default().with_ready(seat, true);
        let id = record.id.clone();
        self.write(&id, &guard, &patch)
    }

    /// Publishes this player's completed target count (standard mode).
    ///
    /// Reaching the match's target score finishes it with this player as
    /// winner, unless the opponent finished first.
    pub fn report_targets(&mut self, completed: u32) -> Result<(), DuelError> {
        let (record, seat) = self.position()?;
        let mut patch = MatchPatch::default().with_rounds(seat, completed);
        if completed >= record.win_threshold() {
            patch = patch.with_finish(self.me.clone(), Utc::now());
        }
        let id = record.id.clone();
        self.write(&id, &MatchGuard::status(MatchStatus::Active), &patch)?;
        Ok(())
    }

    /// Closes `round` and opens the next one, clearing both ready flags.
    ///
    /// In blitz mode the caller is credited with the round and wins the
    /// match on reaching the threshold. Only the first claim of a round
    /// applies; later ones return `false`.
    pub fn claim_round(&mut self, round: u32) -> Result<bool, DuelError> {
        self.refresh()?;
        let (record, seat) = self.position()?;
        if !record.status.is_active() || record.current_round != round {
            return Ok(false);
        }
        let mut patch = MatchPatch::default().with_round(round + 1);
        if record.mode.is_blitz() {
            let won = record.rounds(seat) + 1;
            patch = patch.with_rounds(seat, won);
            if won >= record.win_threshold() {
                patch = patch.with_finish(self.me.clone(), Utc::now());
            }
        }
        let id = record.id.clone();
        let guard = MatchGuard::status(MatchStatus::Active).at_round(round);
        self.write(&id, &guard, &patch)
    }

    /// Leaves the current match.
    ///
    /// An unjoined hosted match is deleted; an active one is finished in the
    /// opponent's favour. A hosted match joined since the last poll counts
    /// as active.
    pub fn leave(&mut self) -> Result<(), DuelError> {
        let Some(mut record) = self.current.clone() else {
            return Ok(());
        };
        if record.status == MatchStatus::Pending && record.player1_id == self.me {
            let cancelled = match self.store.update_match(
                &record.id,
                &MatchGuard::open(),
                &MatchPatch::cancel(),
            ) {
                Ok(cancelled) => cancelled,
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            };
            if cancelled.is_some() {
                self.store.delete_match(&record.id)?;
                log::info!("cancelled match {} on leave", record.id);
                self.detach();
                return Ok(());
            }
            let Some(latest) = self.store.get_match(&record.id)? else {
                self.detach();
                return Ok(());
            };
            record = latest;
        }
        if record.status.is_active()
            && let Some(opponent) = record
                .seat(&self.me)
                .and_then(|seat| record.player(seat.other()))
        {
            let patch = MatchPatch::finish(opponent.clone(), Utc::now());
            let guard = MatchGuard::status(MatchStatus::Active);
            self.store.update_match(&record.id, &guard, &patch)?;
        }
        log::info!("left match {}", record.id);
        self.detach();
        Ok(())
    }

    /// Applies pending feed changes and returns the events since the last
    /// call.
    pub fn poll(&mut self) -> Vec<DuelEvent> {
        let changes: Vec<_> = match &self.feed {
            Some(feed) => iter::from_fn(|| feed.try_recv().ok()).collect(),
            None => vec![],
        };
        for change in changes {
            self.apply_change(change);
        }
        mem::take(&mut self.events)
    }

    /// Advances the launch countdown by one tick.
    pub fn tick(&mut self) {
        let Some(launch) = &mut self.launch else {
            return;
        };
        launch.ticks_left = launch.ticks_left.saturating_sub(1);
        if launch.ticks_left == 0 {
            let PendingLaunch { round, seed, .. } = *launch;
            self.launch = None;
            self.events.push(DuelEvent::LaunchRound { round, seed });
        }
    }

    fn position(&self) -> Result<(&MatchRecord, Seat), DuelError> {
        let record = self.current.as_ref().ok_or(DuelError::NotInMatch)?;
        let seat = record.seat(&self.me).ok_or(DuelError::NotInMatch)?;
        Ok((record, seat))
    }

    fn write(
        &mut self,
        id: &MatchId,
        guard: &MatchGuard,
        patch: &MatchPatch,
    ) -> Result<bool, DuelError> {
        match self.store.update_match(id, guard, patch)? {
            Some(record) => {
                self.absorb(record);
                Ok(true)
            }
            None => {
                self.refresh()?;
                Ok(false)
            }
        }
    }

    fn refresh(&mut self) -> Result<(), DuelError> {
        let Some(id) = self.current.as_ref().map(|record| record.id.clone()) else {
            return Ok(());
        };
        match self.store.get_match(&id)? {
            Some(record) => self.absorb(record),
            None => {
                self.detach();
                self.events.push(DuelEvent::Cancelled);
            }
        }
        Ok(())
    }

    fn create_profile(&self) -> Result<(), DuelError> {
        log::warn!("profile {} is missing; creating one", self.me);
        self.store
            .insert_profile(ProfileRecord::fallback(&self.me))
            .map_err(|e| {
                log::error!("cannot create profile {}: {e}", self.me);
                DuelError::MissingProfile {
                    player: self.me.clone(),
                }
            })
    }

    fn close_stale(&self) -> Result<(), DuelError> {
        let query = MatchQuery {
            statuses: vec![MatchStatus::Pending, MatchStatus::Active],
            player: Some(self.me.clone()),
            ..MatchQuery::default()
        };
        for record in self.store.list_matches(&query)? {
            let opponent = record
                .seat(&self.me)
                .and_then(|seat| record.player(seat.other()));
            let patch = match opponent {
                Some(opponent) => MatchPatch::finish(opponent.clone(), Utc::now()),
                None => MatchPatch::cancel(),
            };
            let guard = MatchGuard::status(record.status);
            match self.store.update_match(&record.id, &guard, &patch) {
                Ok(Some(_)) => log::info!("closed stale match {}", record.id),
                Ok(None) | Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn detach(&mut self) {
        self.current = None;
        self.feed = None;
        self.launch = None;
    }

    fn apply_change(&mut self, change: MatchChange) {
        if self.current.as_ref().is_none_or(|record| record.id != change.id) {
            return;
        }
        if change.kind.is_delete() {
            self.detach();
            self.events.push(DuelEvent::Cancelled);
            return;
        }
        match MatchRecord::from_row(change.row) {
            Ok(record) => self.absorb(record),
            Err(e) => log::warn!("ignoring {} of match {}: {e}", change.kind, change.id),
        }
    }

    fn arm_launch(&mut self, record: &MatchRecord) {
        let round = record.current_round;
        let seed = record.grid_seed.for_round(round);
        match self.config.launch_ticks() {
            0 => {
                self.launch = None;
                self.events.push(DuelEvent::LaunchRound { round, seed });
            }
            ticks_left => {
                self.launch = Some(PendingLaunch {
                    round,
                    seed,
                    ticks_left,
                });
            }
        }
    }

    /// Replaces the current record with `record`, emitting the differences.
    fn absorb(&mut self, record: MatchRecord) {
        let Some(seat) = record.seat(&self.me) else {
            log::warn!("match {} does not involve {}", record.id, self.me);
            return;
        };
        let prev = match self.current.take() {
            Some(prev) if prev.id == record.id => prev,
            _ => {
                self.current = Some(record);
                return;
            }
        };
        if record.progress() < prev.progress() {
            log::debug!("dropping out-of-order row of match {}", record.id);
            self.current = Some(prev);
            return;
        }

        let opponent = seat.other();
        let same_round = prev.current_round == record.current_round;
        if prev.player2_id.is_none()
            && record.status.is_active()
            && let Some(player) = record.player(opponent)
        {
            self.events.push(DuelEvent::MatchStarted {
                opponent: player.clone(),
            });
            self.arm_launch(&record);
        }
        if !same_round {
            self.launch = None;
            self.events.push(DuelEvent::RoundAdvanced {
                round: record.current_round,
            });
        }
        let (mine, theirs) = (record.rounds(seat), record.rounds(opponent));
        if (mine, theirs) != (prev.rounds(seat), prev.rounds(opponent)) {
            self.events.push(DuelEvent::ScoreChanged { mine, theirs });
        }
        if record.status.is_active() {
            if record.is_ready(opponent) && !(same_round && prev.is_ready(opponent)) {
                self.events.push(DuelEvent::OpponentReady);
            }
            if record.both_ready() && !(same_round && prev.both_ready()) {
                self.events.push(DuelEvent::BothReady {
                    round: record.current_round,
                });
                self.arm_launch(&record);
            }
        }
        if record.status != prev.status {
            match record.status {
                MatchStatus::Finished => {
                    self.launch = None;
                    if let Some(outcome) = classify(&record, &self.me) {
                        log::info!("match {} finished: {outcome:?}", record.id);
                        self.events.push(DuelEvent::Finished(outcome));
                    }
                }
                MatchStatus::Cancelled => {
                    self.launch = None;
                    self.events.push(DuelEvent::Cancelled);
                }
                MatchStatus::Pending | MatchStatus::Active => {}
            }
        }
        self.current = Some(record);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{MemoryStore, StoreOperation};

    const CONFIG: DuelConfig = DuelConfig {
        target_score: 5,
        launch_delay_ms: 1500,
        tick_rate: 60,
    };

    type Coordinator = DuelCoordinator<MemoryStore>;

    fn seed() -> GridSeed {
        GridSeed::from_u128(0xdead_beef)
    }

    fn store_with(players: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for player in players {
            store
                .insert_profile(ProfileRecord::fallback(&PlayerId::new(*player)))
                .unwrap();
        }
        store
    }

    fn coordinator(store: &MemoryStore, player: &str) -> Coordinator {
        DuelCoordinator::new(store.clone(), PlayerId::new(player), CONFIG)
    }

    /// Alice hosts, Bob joins; both event queues are drained.
    fn pair(mode: DuelMode) -> (MemoryStore, Coordinator, Coordinator) {
        let store = store_with(&["alice", "bob"]);
        let mut alice = coordinator(&store, "alice");
        let mut bob = coordinator(&store, "bob");
        let record = alice.host(mode, seed()).unwrap();
        assert!(bob.join(&record.id).unwrap().is_joined());
        alice.poll();
        bob.poll();
        (store, alice, bob)
    }

    fn run_ticks(coordinator: &mut Coordinator, ticks: u64) -> Vec<DuelEvent> {
        for _ in 0..ticks {
            coordinator.tick();
        }
        coordinator.poll()
    }

    mod lobby {
        use super::*;

        #[test]
        fn test_host_and_list() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let bob = coordinator(&store, "bob");
            let lobby = bob.lobby_feed(DuelMode::Standard);

            let record = alice.host(DuelMode::Standard, seed()).unwrap();
            assert_eq!(record.status, MatchStatus::Pending);
            assert_eq!(record.target_score, 5);
            assert_eq!(alice.seat(), Some(Seat::Player1));

            assert_eq!(bob.open_matches(DuelMode::Standard).unwrap(), [record.clone()]);
            assert!(bob.open_matches(DuelMode::Blitz).unwrap().is_empty());
            assert!(alice.open_matches(DuelMode::Standard).unwrap().is_empty());
            assert_eq!(lobby.try_recv().unwrap().id, record.id);
        }

        #[test]
        fn test_join_starts_match_on_both_sides() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let mut bob = coordinator(&store, "bob");
            let record = alice.host(DuelMode::Standard, seed()).unwrap();

            let JoinOutcome::Joined(joined) = bob.join(&record.id).unwrap() else {
                panic!("join failed");
            };
            assert_eq!(joined.status, MatchStatus::Active);
            assert_eq!(bob.seat(), Some(Seat::Player2));
            assert_eq!(
                bob.poll(),
                [DuelEvent::MatchStarted {
                    opponent: PlayerId::new("alice")
                }]
            );
            assert_eq!(
                alice.poll(),
                [DuelEvent::MatchStarted {
                    opponent: PlayerId::new("bob")
                }]
            );
        }

        #[test]
        fn test_concurrent_joins() {
            let store = store_with(&["alice", "bob", "carol"]);
            let mut alice = coordinator(&store, "alice");
            let id = alice.host(DuelMode::Blitz, seed()).unwrap().id;

            let handles = ["bob", "carol"].map(|player| {
                let mut joiner = coordinator(&store, player);
                let id = id.clone();
                thread::spawn(move || joiner.join(&id).unwrap().is_joined())
            });
            let joined = handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|&joined| joined)
                .count();
            assert_eq!(joined, 1);

            let events = alice.poll();
            assert_eq!(events.len(), 1);
            assert!(events[0].is_match_started());
        }

        #[test]
        fn test_cannot_join_own_match() {
            let store = store_with(&["alice"]);
            let mut alice = coordinator(&store, "alice");
            let id = alice.host(DuelMode::Standard, seed()).unwrap().id;
            assert_eq!(alice.join(&id).unwrap(), JoinOutcome::Unavailable);
        }

        #[test]
        fn test_cancel_hosting() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let mut bob = coordinator(&store, "bob");
            let id = alice.host(DuelMode::Standard, seed()).unwrap().id;

            assert!(alice.cancel_hosting().unwrap());
            assert!(alice.current().is_none());
            assert_eq!(store.match_count(), 0);
            assert!(bob.open_matches(DuelMode::Standard).unwrap().is_empty());
            assert_eq!(bob.join(&id).unwrap(), JoinOutcome::Unavailable);
            assert!(alice.poll().is_empty());
        }

        #[test]
        fn test_cancel_after_join_keeps_match() {
            let (_store, mut alice, _bob) = pair(DuelMode::Standard);
            assert!(!alice.cancel_hosting().unwrap());
            assert_eq!(alice.current().unwrap().status, MatchStatus::Active);
        }

        #[test]
        fn test_host_leaving_after_unseen_join_forfeits() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let mut bob = coordinator(&store, "bob");
            let id = alice.host(DuelMode::Standard, seed()).unwrap().id;
            assert!(bob.join(&id).unwrap().is_joined());

            // alice still sees her match as pending
            assert_eq!(alice.current().unwrap().status, MatchStatus::Pending);
            alice.leave().unwrap();
            assert!(alice.current().is_none());

            let record = store.get_match(&id).unwrap().unwrap();
            assert_eq!(record.status, MatchStatus::Finished);
            assert_eq!(record.winner_id, Some(PlayerId::new("bob")));
            let events = bob.poll();
            assert!(!events.contains(&DuelEvent::Cancelled));
            let outcome = bob.outcome().unwrap();
            assert!(outcome.won && outcome.abandonment);
        }

        #[test]
        fn test_host_leaving_unjoined_match_deletes_it() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let mut bob = coordinator(&store, "bob");
            let id = alice.host(DuelMode::Standard, seed()).unwrap().id;

            alice.leave().unwrap();
            assert!(alice.current().is_none());
            assert_eq!(store.match_count(), 0);
            assert_eq!(bob.join(&id).unwrap(), JoinOutcome::Unavailable);
        }

        #[test]
        fn test_hosting_closes_stale_matches() {
            let store = store_with(&["alice"]);
            let mut alice = coordinator(&store, "alice");
            let first = alice.host(DuelMode::Standard, seed()).unwrap();
            let second = alice.host(DuelMode::Standard, seed()).unwrap();
            assert_ne!(first.id, second.id);
            let first = store.get_match(&first.id).unwrap().unwrap();
            assert_eq!(first.status, MatchStatus::Cancelled);
            assert_eq!(
                store.get_match(&second.id).unwrap().unwrap().status,
                MatchStatus::Pending
            );
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn test_missing_profile_is_created() {
            let store = MemoryStore::new();
            let mut alice = coordinator(&store, "alice");
            assert!(alice.host(DuelMode::Standard, seed()).is_ok());
            let profile = store.get_profile(&PlayerId::new("alice")).unwrap().unwrap();
            assert_eq!(profile.username, "player-lice");
        }

        #[test]
        fn test_profile_creation_failure() {
            let store = MemoryStore::new();
            store.inject_failure(
                StoreOperation::InsertProfile,
                StoreError::Unavailable {
                    message: "offline".to_owned(),
                },
            );
            let mut alice = coordinator(&store, "alice");
            assert_eq!(
                alice.host(DuelMode::Standard, seed()),
                Err(DuelError::MissingProfile {
                    player: PlayerId::new("alice")
                })
            );
            assert_eq!(store.match_count(), 0);
            assert!(alice.current().is_none());
        }

        #[test]
        fn test_host_survives_failed_reread() {
            let store = store_with(&["alice"]);
            store.inject_failure(
                StoreOperation::GetMatch,
                StoreError::Unavailable {
                    message: "blip".to_owned(),
                },
            );
            let mut alice = coordinator(&store, "alice");
            let record = alice.host(DuelMode::Standard, seed()).unwrap();
            assert_eq!(alice.current(), Some(&record));
            assert_eq!(store.match_count(), 1);

            assert!(alice.cancel_hosting().unwrap());
            assert_eq!(store.match_count(), 0);
        }

        #[test]
        fn test_stale_schema() {
            let store = store_with(&["alice"]);
            store.inject_failure(
                StoreOperation::InsertMatch,
                StoreError::UnknownColumn {
                    column: "mode".to_owned(),
                },
            );
            let mut alice = coordinator(&store, "alice");
            let err = alice.host(DuelMode::Blitz, seed()).unwrap_err();
            assert_eq!(
                err,
                DuelError::StaleSchema {
                    column: "mode".to_owned()
                }
            );
            assert_eq!(store.match_count(), 0);
        }

        #[test]
        fn test_not_in_match() {
            let store = store_with(&["alice"]);
            let mut alice = coordinator(&store, "alice");
            assert_eq!(alice.set_ready(), Err(DuelError::NotInMatch));
            assert_eq!(alice.report_targets(1), Err(DuelError::NotInMatch));
            assert!(alice.leave().is_ok());
        }
    }

    mod rounds {
        use super::*;

        #[test]
        fn test_first_round_launches_after_delay() {
            let store = store_with(&["alice", "bob"]);
            let mut alice = coordinator(&store, "alice");
            let mut bob = coordinator(&store, "bob");
            let id = alice.host(DuelMode::Standard, seed()).unwrap().id;
            bob.join(&id).unwrap();
            alice.poll();
            bob.poll();

            assert!(run_ticks(&mut alice, 89).is_empty());
            let launch = DuelEvent::LaunchRound {
                round: 1,
                seed: seed().for_round(1),
            };
            assert_eq!(run_ticks(&mut alice, 1), [launch.clone()]);
            assert_eq!(run_ticks(&mut bob, 90), [launch]);
        }

        #[test]
        fn test_ready_handshake() {
            let (_store, mut alice, mut bob) = pair(DuelMode::Standard);
            assert!(alice.claim_round(1).unwrap());
            assert_eq!(alice.poll(), [DuelEvent::RoundAdvanced { round: 2 }]);
            assert!(bob.poll().contains(&DuelEvent::RoundAdvanced { round: 2 }));
            assert!(!bob.is_launching());

            assert!(alice.set_ready().unwrap());
            assert_eq!(bob.poll(), [DuelEvent::OpponentReady]);
            assert!(bob.set_ready().unwrap());
            assert_eq!(bob.poll(), [DuelEvent::BothReady { round: 2 }]);
            assert_eq!(
                alice.poll(),
                [DuelEvent::OpponentReady, DuelEvent::BothReady { round: 2 }]
            );

            let launch = DuelEvent::LaunchRound {
                round: 2,
                seed: seed().for_round(2),
            };
            assert_eq!(run_ticks(&mut alice, 90), [launch.clone()]);
            assert_eq!(run_ticks(&mut bob, 90), [launch]);
        }

        #[test]
        fn test_blitz_round_goes_to_first_claim() {
            let (store, mut alice, mut bob) = pair(DuelMode::Blitz);
            assert!(alice.claim_round(1).unwrap());
            assert!(!bob.claim_round(1).unwrap());

            let events = bob.poll();
            assert!(events.contains(&DuelEvent::RoundAdvanced { round: 2 }));
            assert!(events.contains(&DuelEvent::ScoreChanged { mine: 0, theirs: 1 }));

            let id = alice.current().unwrap().id.clone();
            let record = store.get_match(&id).unwrap().unwrap();
            assert_eq!((record.p1_rounds, record.p2_rounds), (1, 0));
            assert_eq!(record.current_round, 2);
            assert!(!record.p1_ready && !record.p2_ready);
        }

        #[test]
        fn test_blitz_best_of_five() {
            let (_store, mut alice, mut bob) = pair(DuelMode::Blitz);
            for round in 1..=3 {
                assert!(alice.claim_round(round).unwrap());
            }
            let expected = DuelOutcome {
                won: true,
                abandonment: false,
                mine: 3,
                theirs: 0,
            };
            assert_eq!(alice.outcome(), Some(expected));
            assert!(!alice.claim_round(4).unwrap());
            assert!(bob.poll().contains(&DuelEvent::Finished(DuelOutcome {
                won: false,
                abandonment: false,
                mine: 0,
                theirs: 3,
            })));
        }

        #[test]
        fn test_standard_race_to_target_score() {
            let (_store, mut alice, mut bob) = pair(DuelMode::Standard);
            alice.report_targets(3).unwrap();
            assert_eq!(bob.poll(), [DuelEvent::ScoreChanged { mine: 0, theirs: 3 }]);
            bob.report_targets(4).unwrap();
            alice.report_targets(5).unwrap();
            assert_eq!(
                alice.outcome(),
                Some(DuelOutcome {
                    won: true,
                    abandonment: false,
                    mine: 5,
                    theirs: 4,
                })
            );

            // too late: the match is already finished
            bob.report_targets(5).unwrap();
            assert_eq!(
                bob.outcome(),
                Some(DuelOutcome {
                    won: false,
                    abandonment: false,
                    mine: 4,
                    theirs: 5,
                })
            );
        }

        #[test]
        fn test_leaving_forfeits() {
            let (store, mut alice, mut bob) = pair(DuelMode::Standard);
            alice.report_targets(2).unwrap();
            alice.poll();
            bob.poll();
            let id = bob.current().unwrap().id.clone();

            bob.leave().unwrap();
            assert!(bob.current().is_none());
            let record = store.get_match(&id).unwrap().unwrap();
            assert_eq!(record.winner_id, Some(PlayerId::new("alice")));
            assert!(record.finished_at.is_some());
            assert_eq!(
                alice.poll(),
                [DuelEvent::Finished(DuelOutcome {
                    won: true,
                    abandonment: true,
                    mine: 2,
                    theirs: 0,
                })]
            );
        }
    }

    mod outcomes {
        use super::*;

        fn finished(mode: DuelMode, winner_rounds: u32) -> MatchRecord {
            let mut record = NewMatch {
                player1_id: PlayerId::new("alice"),
                grid_seed: seed(),
                mode,
                target_score: 5,
            }
            .into_record(MatchId::new("m-1"), Utc::now());
            MatchPatch::join(PlayerId::new("bob")).apply(&mut record);
            MatchPatch::finish(PlayerId::new("bob"), Utc::now())
                .with_rounds(Seat::Player2, winner_rounds)
                .apply(&mut record);
            record
        }

        #[test]
        fn test_abandonment_threshold() {
            let bob = PlayerId::new("bob");
            assert!(!classify(&finished(DuelMode::Standard, 5), &bob).unwrap().abandonment);
            assert!(classify(&finished(DuelMode::Standard, 4), &bob).unwrap().abandonment);
            assert!(!classify(&finished(DuelMode::Blitz, 3), &bob).unwrap().abandonment);
            assert!(classify(&finished(DuelMode::Blitz, 2), &bob).unwrap().abandonment);
        }

        #[test]
        fn test_outcome_per_player() {
            let record = finished(DuelMode::Blitz, 3);
            assert!(classify(&record, &PlayerId::new("bob")).unwrap().won);
            let alice = classify(&record, &PlayerId::new("alice")).unwrap();
            assert!(!alice.won);
            assert_eq!((alice.mine, alice.theirs), (0, 3));
            assert_eq!(classify(&record, &PlayerId::new("carol")), None);
        }

        #[test]
        fn test_unfinished_has_no_outcome() {
            let record = NewMatch {
                player1_id: PlayerId::new("alice"),
                grid_seed: seed(),
                mode: DuelMode::Standard,
                target_score: 5,
            }
            .into_record(MatchId::new("m-1"), Utc::now());
            assert_eq!(classify(&record, &PlayerId::new("alice")), None);
        }
    }
}
