//! Engine error types.

use thiserror::Error;

use crate::store::StoreError;
use crate::types::{EntryId, InvalidId, UserId, ValidationError};

/// Coarse classification of an [`EngineError`] for callers that map errors
/// onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidId,
    NotFound,
    Validation,
    Conflict,
    Store,
}

/// Errors returned by [`crate::TimeEntryService`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A malformed identifier. Raised before any storage access.
    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Missing or malformed caller-supplied fields.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The owner already has a running timer and the single-timer policy is on.
    #[error("user {user_id} already has a running time entry: {entry_id}")]
    TimerAlreadyRunning { user_id: UserId, entry_id: EntryId },

    /// Unexpected persistence failure.
    #[error("failed to {operation}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Aggregates could not be resynchronized after the entry was persisted.
    ///
    /// The entry mutation itself has been committed.
    #[error("time entry {entry_id} was saved but its aggregates are stale")]
    Sync {
        entry_id: EntryId,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Returns the error classification.
    ///
    /// Aggregate sync failures after a committed mutation are reported as
    /// [`ErrorKind::Store`], never as the inner kind.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::TimerAlreadyRunning { .. } => ErrorKind::Conflict,
            Self::Store { .. } | Self::Sync { .. } => ErrorKind::Store,
        }
    }

    /// Builds a mapper that wraps a store error with operation context,
    /// translating the store's not-found signal into [`EngineError::NotFound`].
    pub(crate) fn from_store(
        operation: &'static str,
        entity: &'static str,
        id: impl ToString,
    ) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::NotFound => Self::NotFound {
                entity,
                id: id.to_string(),
            },
            source => Self::Store { operation, source },
        }
    }

    /// Wraps a store error with operation context. Not-found is not expected
    /// for this operation and is reported as a store failure.
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { operation, source }
    }
}
