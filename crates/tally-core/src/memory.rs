//! In-memory store, for tests and embedding without a database.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::records::{ProjectRecord, TaskRecord};
use crate::store::{AggregateWriter, StoreError, TimeEntryStore};
use crate::time_entry::TimeEntry;
use crate::types::{EntryId, PageRequest, ProjectId, TaskId, UserId};

/// Keeps entries, tasks and projects in maps. Orderings match the `SQLite` store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<EntryId, TimeEntry>,
    tasks: HashMap<TaskId, TaskRecord>,
    projects: HashMap<ProjectId, ProjectRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&mut self, task: TaskRecord) {
        self.tasks.insert(task.id, task);
    }

    pub fn insert_project(&mut self, project: ProjectRecord) {
        self.projects.insert(project.id, project);
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn project(&self, id: &ProjectId) -> Option<&ProjectRecord> {
        self.projects.get(id)
    }

    /// All entries, ordered by id.
    pub fn entries(&self) -> Vec<TimeEntry> {
        self.entries.values().cloned().collect()
    }

    fn owned_by<'a>(&'a self, user: &'a UserId) -> impl Iterator<Item = &'a TimeEntry> + 'a {
        self.entries
            .values()
            .filter(move |entry| entry.user_id == *user)
    }
}

fn paged<'a>(entries: impl Iterator<Item = &'a TimeEntry>, page: PageRequest) -> Vec<TimeEntry> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    entries.skip(offset).take(limit).cloned().collect()
}

fn capped(entries: Vec<&TimeEntry>, limit: u64) -> Vec<TimeEntry> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    entries.into_iter().take(limit).cloned().collect()
}

impl TimeEntryStore for MemoryStore {
    fn insert_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError> {
        self.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, StoreError> {
        self.entries.get(id).cloned().ok_or(StoreError::NotFound)
    }

    fn update_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError> {
        let slot = self
            .entries
            .get_mut(&entry.id)
            .ok_or(StoreError::NotFound)?;
        *slot = entry.clone();
        Ok(())
    }

    fn delete_entry(&mut self, id: &EntryId) -> Result<(), StoreError> {
        self.entries
            .remove(id)
            .map(drop)
            .ok_or(StoreError::NotFound)
    }

    fn list_running(&self, user: &UserId, page: PageRequest) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(paged(
            self.owned_by(user).filter(|entry| entry.is_running()),
            page,
        ))
    }

    fn list_created_between(
        &self,
        user: &UserId,
        page: PageRequest,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(paged(
            self.owned_by(user)
                .filter(|entry| entry.date_created >= from && entry.date_created <= to),
            page,
        ))
    }

    fn list_stopped_between(
        &self,
        user: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let mut entries: Vec<&TimeEntry> = self
            .owned_by(user)
            .filter(|entry| entry.stop.is_some_and(|stop| stop >= from && stop <= to))
            .collect();
        entries.sort_by(|a, b| a.duration.cmp(&b.duration).then_with(|| a.id.cmp(&b.id)));
        Ok(capped(entries, limit))
    }

    fn list_recent(&self, user: &UserId, limit: u64) -> Result<Vec<TimeEntry>, StoreError> {
        let mut entries: Vec<&TimeEntry> = self.owned_by(user).collect();
        entries.sort_by(|a, b| b.start.cmp(&a.start).then_with(|| a.id.cmp(&b.id)));
        Ok(capped(entries, limit))
    }

    fn sum_task_durations(&self, task: &TaskId) -> Result<i64, StoreError> {
        Ok(self
            .entries
            .values()
            .filter(|entry| entry.task_id == *task && !entry.is_running())
            .map(|entry| entry.duration)
            .sum())
    }

    fn sum_project_durations(&self, project: &ProjectId) -> Result<i64, StoreError> {
        Ok(self
            .entries
            .values()
            .filter(|entry| entry.project_id == *project && !entry.is_running())
            .map(|entry| entry.duration)
            .sum())
    }
}

impl AggregateWriter for MemoryStore {
    fn write_task_tracked(
        &mut self,
        task: &TaskId,
        tracked_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = self.tasks.get_mut(task).ok_or(StoreError::NotFound)?;
        record.tracked_seconds = tracked_seconds;
        record.date_updated = now;
        Ok(())
    }

    fn write_project_estimate(
        &mut self,
        project: &ProjectId,
        estimated_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let record = self.projects.get_mut(project).ok_or(StoreError::NotFound)?;
        if !record.auto_estimates {
            return Ok(false);
        }
        record.estimated_hours = estimated_hours;
        record.date_updated = now;
        Ok(true)
    }
}
