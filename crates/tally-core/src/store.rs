//! Storage ports the engine is written against.
//!
//! `tally-db` implements these for `SQLite`; [`crate::memory::MemoryStore`]
//! implements them in memory.

use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::time_entry::TimeEntry;
use crate::types::{EntryId, PageRequest, ProjectId, TaskId, UserId};

/// Errors surfaced by storage implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("record not found")]
    NotFound,

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend-specific error.
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Persistence for individual time entries.
///
/// Every write is expected to commit or roll back as a unit.
pub trait TimeEntryStore {
    /// Inserts a new entry.
    fn insert_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError>;

    /// Loads an entry, or [`StoreError::NotFound`].
    fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, StoreError>;

    /// Replaces an existing entry, or [`StoreError::NotFound`].
    fn update_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError>;

    /// Deletes an entry, or [`StoreError::NotFound`].
    fn delete_entry(&mut self, id: &EntryId) -> Result<(), StoreError>;

    /// Running entries for `user`, ordered by id.
    fn list_running(&self, user: &UserId, page: PageRequest)
    -> Result<Vec<TimeEntry>, StoreError>;

    /// Entries for `user` whose `date_created` lies in `[from, to]`, ordered by id.
    fn list_created_between(
        &self,
        user: &UserId,
        page: PageRequest,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, StoreError>;

    /// Entries for `user` whose `stop` lies in `[from, to]`, shortest first.
    fn list_stopped_between(
        &self,
        user: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<TimeEntry>, StoreError>;

    /// The most recently started entries for `user`, newest first.
    fn list_recent(&self, user: &UserId, limit: u64) -> Result<Vec<TimeEntry>, StoreError>;

    /// Sum of finished durations (seconds) referencing `task`.
    ///
    /// Running entries are not counted.
    fn sum_task_durations(&self, task: &TaskId) -> Result<i64, StoreError>;

    /// Sum of finished durations (seconds) referencing `project`.
    ///
    /// Running entries are not counted.
    fn sum_project_durations(&self, project: &ProjectId) -> Result<i64, StoreError>;
}

/// Narrow write paths for the aggregates cached on task and project records.
pub trait AggregateWriter {
    /// Writes `tracked_seconds` and `date_updated` onto a task.
    ///
    /// Returns [`StoreError::NotFound`] if the task does not exist.
    fn write_task_tracked(
        &mut self,
        task: &TaskId,
        tracked_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Writes `estimated_hours` and `date_updated` onto a project that has
    /// automatic estimates enabled.
    ///
    /// Returns `Ok(false)` without writing if the project opted out, and
    /// [`StoreError::NotFound`] if it does not exist.
    fn write_project_estimate(
        &mut self,
        project: &ProjectId,
        estimated_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Source of identifiers for new entries.
pub trait IdGenerator {
    fn next_id(&mut self) -> EntryId;
}

/// Random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Ids;

impl IdGenerator for UuidV4Ids {
    fn next_id(&mut self) -> EntryId {
        EntryId::from_uuid(Uuid::new_v4())
    }
}

/// Deterministic, increasing UUIDs starting at `Uuid::from_u128(1)`.
///
/// Useful for fixtures where id order must match creation order.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    last: u128,
}

impl SequentialIds {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Continues after `last`.
    #[must_use]
    pub const fn starting_after(last: u128) -> Self {
        Self { last }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> EntryId {
        self.last += 1;
        EntryId::from_uuid(Uuid::from_u128(self.last))
    }
}
