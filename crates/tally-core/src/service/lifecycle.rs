//! Create, start, stop, update, delete, and tag edits.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::store::{AggregateWriter, IdGenerator, TimeEntryStore};
use crate::time_entry::{EntryDetails, EntryFields, NewTimeEntry, TimeEntry, TimeEntryPatch};
use crate::types::{EntryId, PageRequest, ProjectId, TagMode, TaskId, UserId, ValidationError};

use super::TimeEntryService;

impl<S, G> TimeEntryService<S, G>
where
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    /// Records a finished entry and syncs its task and project aggregates.
    pub fn create(
        &mut self,
        input: &NewTimeEntry,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, EngineError> {
        let user_id = UserId::parse(owner)?;
        let details = EntryDetails::validate(&input.fields)?;
        let start = input
            .start
            .ok_or(ValidationError::Missing { field: "start" })?;
        let duration = input
            .duration
            .ok_or(ValidationError::Missing { field: "duration" })?;

        let entry = TimeEntry::finished(
            self.ids.next_id(),
            user_id,
            details,
            start,
            duration,
            now,
        )?;
        self.store
            .insert_entry(&entry)
            .map_err(EngineError::store("insert time entry"))?;
        tracing::debug!(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            duration = entry.duration,
            "created time entry"
        );

        self.resync(&entry.id, &[(entry.task_id, entry.project_id)], now)?;
        Ok(entry)
    }

    /// Starts a running timer at `now`.
    ///
    /// Aggregates are not touched: a running entry has no finished duration.
    pub fn start(
        &mut self,
        fields: &EntryFields,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, EngineError> {
        let user_id = UserId::parse(owner)?;
        let details = EntryDetails::validate(fields)?;

        if self.config.single_running_timer {
            let running = self
                .store
                .list_running(&user_id, PageRequest::new(1, 1)?)
                .map_err(EngineError::store("list running time entries"))?;
            if let Some(existing) = running.first() {
                return Err(EngineError::TimerAlreadyRunning {
                    user_id,
                    entry_id: existing.id,
                });
            }
        }

        let entry = TimeEntry::running(self.ids.next_id(), user_id, details, now);
        self.store
            .insert_entry(&entry)
            .map_err(EngineError::store("insert time entry"))?;
        tracing::debug!(entry_id = %entry.id, user_id = %entry.user_id, "started timer");
        Ok(entry)
    }

    /// Stops an entry at `now` and syncs its task and project aggregates.
    pub fn stop(&mut self, id: &str, now: DateTime<Utc>) -> Result<TimeEntry, EngineError> {
        let entry_id = EntryId::parse(id)?;
        let mut entry = self.load_entry(&entry_id)?;
        let was_running = entry.is_running();

        entry.stop_at(now)?;
        self.save_entry(&entry)?;
        tracing::debug!(
            entry_id = %entry.id,
            duration = entry.duration,
            was_running,
            "stopped time entry"
        );

        self.resync(&entry.id, &[(entry.task_id, entry.project_id)], now)?;
        Ok(entry)
    }

    /// Applies a partial update.
    ///
    /// Aggregates are only resynced when [`super::EngineConfig::resync_on_edit`]
    /// is set; both the previous and the new task/project are refreshed.
    pub fn update(
        &mut self,
        id: &str,
        patch: &TimeEntryPatch,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, EngineError> {
        let entry_id = EntryId::parse(id)?;
        let mut entry = self.load_entry(&entry_id)?;
        let previous = (entry.task_id, entry.project_id);

        entry.apply_patch(patch, now)?;
        self.save_entry(&entry)?;
        tracing::debug!(entry_id = %entry.id, duration = entry.duration, "updated time entry");

        if self.config.resync_on_edit {
            self.resync(
                &entry.id,
                &[previous, (entry.task_id, entry.project_id)],
                now,
            )?;
        }
        Ok(entry)
    }

    /// Deletes an entry, returning what was removed.
    ///
    /// Aggregates are only resynced when [`super::EngineConfig::resync_on_edit`]
    /// is set.
    pub fn delete(&mut self, id: &str, now: DateTime<Utc>) -> Result<TimeEntry, EngineError> {
        let entry_id = EntryId::parse(id)?;
        let entry = self.load_entry(&entry_id)?;
        self.store
            .delete_entry(&entry_id)
            .map_err(EngineError::from_store(
                "delete time entry",
                "time entry",
                entry_id,
            ))?;
        tracing::debug!(entry_id = %entry_id, "deleted time entry");

        if self.config.resync_on_edit {
            self.resync(&entry.id, &[(entry.task_id, entry.project_id)], now)?;
        }
        Ok(entry)
    }

    /// Adds tags to, or removes tags from, one entry.
    pub fn update_tags(
        &mut self,
        id: &str,
        tags: &[String],
        mode: TagMode,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, EngineError> {
        let entry_id = EntryId::parse(id)?;
        let mut entry = self.load_entry(&entry_id)?;
        entry.edit_tags(tags, mode, now);
        self.save_entry(&entry)?;
        tracing::debug!(entry_id = %entry.id, %mode, tags = entry.tags.len(), "edited tags");
        Ok(entry)
    }

    pub(super) fn load_entry(&self, id: &EntryId) -> Result<TimeEntry, EngineError> {
        self.store
            .get_entry(id)
            .map_err(EngineError::from_store("load time entry", "time entry", id))
    }

    fn save_entry(&mut self, entry: &TimeEntry) -> Result<(), EngineError> {
        self.store
            .update_entry(entry)
            .map_err(EngineError::from_store(
                "update time entry",
                "time entry",
                entry.id,
            ))
    }

    /// Recomputes the aggregates for each distinct non-sentinel task and
    /// project in `targets`.
    fn resync(
        &mut self,
        entry_id: &EntryId,
        targets: &[(TaskId, ProjectId)],
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut tasks: Vec<TaskId> = targets
            .iter()
            .map(|(task, _)| *task)
            .filter(|task| !task.is_none())
            .collect();
        tasks.dedup();
        let mut projects: Vec<ProjectId> = targets
            .iter()
            .map(|(_, project)| *project)
            .filter(|project| !project.is_none())
            .collect();
        projects.dedup();

        let result = tasks
            .iter()
            .try_for_each(|task| self.sync_task(task, now).map(drop))
            .and_then(|()| {
                projects
                    .iter()
                    .try_for_each(|project| self.sync_project(project, now).map(drop))
            });

        result.map_err(|err| {
            tracing::warn!(entry_id = %entry_id, error = %err, "aggregate sync failed");
            EngineError::Sync {
                entry_id: *entry_id,
                source: Box::new(err),
            }
        })
    }
}
