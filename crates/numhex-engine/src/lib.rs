pub use self::{config::*, core::*, engine::*};

pub mod config;
pub mod core;
pub mod engine;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid cell id {input:?}: expected \"row-col\"")]
pub struct CellIdParseError {
    input: String,
}

impl CellIdParseError {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid cell value {input:?}: expected a digit or one of + - × ÷")]
pub struct CellValueParseError {
    input: String,
}

impl CellValueParseError {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed {input:?}: {reason}")]
pub struct SeedParseError {
    input: String,
    reason: String,
}

impl SeedParseError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GridError {
    #[display("grid has {actual} cells, expected {expected}")]
    CellCount { expected: usize, actual: usize },
    #[display("cell {found} found where {expected} was expected")]
    Misplaced { expected: CellId, found: CellId },
    #[display("cell {id} has a value of the wrong kind for its position")]
    WrongKind { id: CellId },
    #[display("number cell {id} holds {value}, expected a single digit")]
    DigitRange { id: CellId, value: u8 },
}

/// Reasons a cell is refused when building a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ExtendRejection {
    #[display("input is not accepted right now")]
    InputLocked,
    #[display("no path is being built")]
    NotStarted,
    #[display("a path must start on a number cell")]
    NotNumber,
    #[display("cell is not on the grid")]
    UnknownCell,
    #[display("cell is already part of the path")]
    AlreadySelected,
    #[display("cell has the same kind as the previous one")]
    SameKind,
    #[display("cell is not adjacent to the previous one")]
    NotAdjacent,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid configuration: {field} {reason}")]
pub struct ConfigError {
    field: &'static str,
    reason: String,
}

impl ConfigError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }
}

/// A session transition requested from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cannot {action} while the session is {from}")]
pub struct TransitionError {
    action: &'static str,
    from: SessionStatus,
}

impl TransitionError {
    pub(crate) fn new(action: &'static str, from: SessionStatus) -> Self {
        Self { action, from }
    }

    #[must_use]
    pub fn from_status(&self) -> SessionStatus {
        self.from
    }
}

/// Failure reported by an insight provider.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InsightError {
    #[display("no credentials configured for the insight service")]
    MissingCredentials,
    #[display("insight service failed: {message}")]
    Service { message: String },
}
