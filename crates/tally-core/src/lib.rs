//! Core domain logic for tally.
//!
//! This crate contains:
//! - Time entries: the running/stopped interval model and its transitions
//! - Storage ports: the traits a backing store implements
//! - The service: lifecycle operations, aggregate sync, and queries

mod error;
pub mod memory;
pub mod records;
mod service;
pub mod store;
pub mod time_entry;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{EngineError, ErrorKind};
pub use records::{ProjectRecord, TaskRecord};
pub use service::{
    BatchItem, BatchOutcome, DASHBOARD_RECENT_LIMIT, DASHBOARD_TOP_LIMIT, DASHBOARD_WINDOW,
    Dashboard, EngineConfig, ProjectSync, TaskSync, TimeEntryService, parse_id_list,
    seconds_to_hours,
};
pub use store::{
    AggregateWriter, IdGenerator, SequentialIds, StoreError, TimeEntryStore, UuidV4Ids,
};
pub use time_entry::{
    EntryFields, EntryState, NewTimeEntry, RUNNING_DURATION, TimeEntry, TimeEntryPatch,
};
pub use types::{
    EntryId, InvalidId, PageRequest, ProjectId, TagMode, TaskId, UserId, ValidationError,
    WorkspaceId,
};
