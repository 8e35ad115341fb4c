//! Aggregate recomputation for tasks and projects.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::store::{AggregateWriter, IdGenerator, TimeEntryStore};
use crate::time_entry::whole_seconds;
use crate::types::{ProjectId, TaskId};

use super::TimeEntryService;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Result of a task aggregate sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSync {
    pub task_id: TaskId,
    pub tracked_seconds: i64,
}

/// Result of a project aggregate sync.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectSync {
    pub project_id: ProjectId,
    pub estimated_hours: f64,
    /// False when the project has automatic estimates disabled and was left
    /// untouched.
    pub applied: bool,
}

/// Converts tracked seconds to fractional hours.
#[expect(
    clippy::cast_precision_loss,
    reason = "second totals stay far below 2^52"
)]
pub fn seconds_to_hours(seconds: i64) -> f64 {
    seconds as f64 / SECONDS_PER_HOUR
}

impl<S, G> TimeEntryService<S, G>
where
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    /// Recomputes a task's `tracked_seconds` from its finished entries.
    pub fn sync_task_time(
        &mut self,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskSync, EngineError> {
        let task_id = TaskId::parse(task_id)?;
        self.sync_task(&task_id, now)
    }

    /// Recomputes a project's `estimated_hours` from its finished entries.
    ///
    /// Projects without automatic estimates are left untouched.
    pub fn sync_project_time(
        &mut self,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectSync, EngineError> {
        let project_id = ProjectId::parse(project_id)?;
        self.sync_project(&project_id, now)
    }

    pub(super) fn sync_task(
        &mut self,
        task_id: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<TaskSync, EngineError> {
        let tracked_seconds = self
            .store
            .sum_task_durations(task_id)
            .map_err(EngineError::from_store(
                "sum task durations",
                "task",
                task_id,
            ))?;
        self.store
            .write_task_tracked(task_id, tracked_seconds, whole_seconds(now))
            .map_err(EngineError::from_store(
                "write task tracked time",
                "task",
                task_id,
            ))?;
        tracing::debug!(task_id = %task_id, tracked_seconds, "synced task time");

        Ok(TaskSync {
            task_id: *task_id,
            tracked_seconds,
        })
    }

    pub(super) fn sync_project(
        &mut self,
        project_id: &ProjectId,
        now: DateTime<Utc>,
    ) -> Result<ProjectSync, EngineError> {
        let seconds = self
            .store
            .sum_project_durations(project_id)
            .map_err(EngineError::from_store(
                "sum project durations",
                "project",
                project_id,
            ))?;
        let estimated_hours = seconds_to_hours(seconds);
        let applied = self
            .store
            .write_project_estimate(project_id, estimated_hours, whole_seconds(now))
            .map_err(EngineError::from_store(
                "write project estimate",
                "project",
                project_id,
            ))?;
        if applied {
            tracing::debug!(project_id = %project_id, estimated_hours, "synced project estimate");
        } else {
            tracing::debug!(project_id = %project_id, "project opted out of automatic estimates");
        }

        Ok(ProjectSync {
            project_id: *project_id,
            estimated_hours,
            applied,
        })
    }
}
