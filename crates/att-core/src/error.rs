//! Error taxonomy surfaced by every core operation.

use std::fmt;

use thiserror::Error;

use crate::types::ValidationError;

/// The kind of entity an identifier referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Group,
    Task,
    Period,
    Entry,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Task => "task",
            Self::Period => "period",
            Self::Entry => "time entry",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a timer transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// `start` while a session is already running.
    AlreadyRunning { entry_id: i64 },
    /// `stop` while idle.
    NotRunning,
    /// `stop` named an entry other than the active one.
    EntryMismatch { requested: i64, active: i64 },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning { entry_id } => {
                write!(f, "a timer is already running (entry {entry_id})")
            }
            Self::NotRunning => f.write_str("no timer is running"),
            Self::EntryMismatch { requested, active } => write!(
                f,
                "entry {requested} is not the running session (entry {active} is)"
            ),
        }
    }
}

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// The timer refused the transition.
    #[error("timer conflict: {0}")]
    Conflict(Conflict),

    /// The persistence collaborator failed.
    #[error("storage failure")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wraps a store failure.
    pub fn collaborator<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collaborator(Box::new(source))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Lifts a store result into the core taxonomy.
pub(crate) trait CollaboratorExt<T> {
    fn collab(self) -> Result<T>;
}

impl<T, E> CollaboratorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn collab(self) -> Result<T> {
        self.map_err(Error::collaborator)
    }
}
