//! Best-effort batch edits over comma-separated id lists.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::store::{AggregateWriter, IdGenerator, TimeEntryStore};
use crate::time_entry::{TimeEntry, TimeEntryPatch};
use crate::types::TagMode;

use super::TimeEntryService;

/// Splits a comma-separated id list, trimming items and skipping blanks.
pub fn parse_id_list(ids: &str) -> Vec<&str> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect()
}

/// Outcome for one id of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub id: String,
    pub result: Result<TimeEntry, EngineError>,
}

/// Per-id outcomes of a batch, in input order.
///
/// Each id is applied independently. Earlier successes are kept when a
/// later id fails.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> impl Iterator<Item = &TimeEntry> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &EngineError)> {
        self.items
            .iter()
            .filter_map(|item| {
                let err = item.result.as_ref().err()?;
                Some((item.id.as_str(), err))
            })
    }

    pub fn is_complete_success(&self) -> bool {
        self.items.iter().all(|item| item.result.is_ok())
    }
}

impl<S, G> TimeEntryService<S, G>
where
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    /// Applies [`Self::update_tags`] to every id in `ids`.
    pub fn update_tags_batch(
        &mut self,
        ids: &str,
        tags: &[String],
        mode: TagMode,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        self.for_each_id(ids, |service, id| service.update_tags(id, tags, mode, now))
    }

    /// Applies [`Self::update`] to every id in `ids`.
    pub fn update_batch(
        &mut self,
        ids: &str,
        patch: &TimeEntryPatch,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        self.for_each_id(ids, |service, id| service.update(id, patch, now))
    }

    fn for_each_id<F>(&mut self, ids: &str, mut apply: F) -> BatchOutcome
    where
        F: FnMut(&mut Self, &str) -> Result<TimeEntry, EngineError>,
    {
        let items: Vec<BatchItem> = parse_id_list(ids)
            .into_iter()
            .map(|id| BatchItem {
                id: id.to_string(),
                result: apply(self, id),
            })
            .collect();

        let failures = items.iter().filter(|item| item.result.is_err()).count();
        if failures > 0 {
            tracing::warn!(total = items.len(), failures, "batch edit partially failed");
        } else {
            tracing::debug!(total = items.len(), "batch edit applied");
        }
        BatchOutcome { items }
    }
}
