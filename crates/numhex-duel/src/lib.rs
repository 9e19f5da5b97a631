//! Two-player duels over a shared match record.
//!
//! Both players hold a [`DuelCoordinator`] pointing at the same
//! [`MatchStore`]. Every change to a match is a targeted conditional update
//! of a single row, and each side learns about the other's changes through
//! the store's change feed.

pub use self::{coordinator::*, memory::*, schema::*, store::*};

mod coordinator;
mod memory;
mod schema;
mod store;

/// Failure reported by a [`MatchStore`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("profile {player} does not exist")]
    MissingProfile { player: PlayerId },
    #[display("column {column:?} does not exist")]
    UnknownColumn { column: String },
    #[display("match {id} does not exist")]
    NotFound { id: MatchId },
    #[display("store unavailable: {message}")]
    Unavailable { message: String },
}

/// A change-feed row that does not describe a valid match.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("malformed match row: {message}")]
    Malformed { message: String },
    #[display("match {id} is active without a second player")]
    MissingOpponent { id: MatchId },
    #[display("match {id} pairs a player with themselves")]
    SelfMatch { id: MatchId },
    #[display("finished match {id} has no winner")]
    MissingWinner { id: MatchId },
    #[display("match {id} names a winner who is not playing")]
    ForeignWinner { id: MatchId },
}

/// User-facing duel failure.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DuelError {
    #[display("your player profile is missing and could not be created")]
    MissingProfile { player: PlayerId },
    #[display("the match server uses an outdated schema (missing column {column:?})")]
    StaleSchema { column: String },
    #[display("you are not in a match")]
    NotInMatch,
    #[display("match service error: {source}")]
    Store { source: StoreError },
}

impl From<StoreError> for DuelError {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::MissingProfile { player } => DuelError::MissingProfile { player },
            StoreError::UnknownColumn { column } => DuelError::StaleSchema { column },
            source => DuelError::Store { source },
        }
    }
}
