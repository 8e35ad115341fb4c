//! The time-entry service: lifecycle, aggregation sync, and queries.
//!
//! Every operation runs synchronously inside the call. Mutations that
//! finalize a duration (create, stop) recompute the referenced task and
//! project aggregates before returning. If that recomputation fails, the
//! entry mutation stays committed and the call returns
//! [`EngineError::Sync`](crate::EngineError::Sync).
//!
//! # Policies
//!
//! [`EngineConfig`] holds the two opt-in switches. With the defaults, update
//! and delete leave aggregates alone, and an owner may have several running
//! timers at once.

mod batch;
mod lifecycle;
mod query;
mod sync;

use serde::{Deserialize, Serialize};

use crate::store::{AggregateWriter, IdGenerator, TimeEntryStore, UuidV4Ids};

pub use batch::{BatchItem, BatchOutcome, parse_id_list};
pub use query::{DASHBOARD_RECENT_LIMIT, DASHBOARD_TOP_LIMIT, DASHBOARD_WINDOW, Dashboard};
pub use sync::{ProjectSync, TaskSync, seconds_to_hours};

/// Behavior switches for [`TimeEntryService`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resync task/project aggregates after update and delete as well.
    pub resync_on_edit: bool,
    /// Refuse to start a timer while the owner already has one running.
    pub single_running_timer: bool,
}

/// Orchestrates time-entry mutations, aggregate sync, and reads.
pub struct TimeEntryService<S, G = UuidV4Ids> {
    store: S,
    ids: G,
    config: EngineConfig,
}

impl<S> TimeEntryService<S>
where
    S: TimeEntryStore + AggregateWriter,
{
    /// Creates a service with random entry ids and default policies.
    pub fn new(store: S) -> Self {
        Self::with_ids(store, UuidV4Ids)
    }
}

impl<S, G> TimeEntryService<S, G>
where
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    /// Creates a service with a custom id generator.
    pub fn with_ids(store: S, ids: G) -> Self {
        Self {
            store,
            ids,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the policy switches.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
