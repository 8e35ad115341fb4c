//! Task and project records, limited to the fields the engine reads or writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, TaskId, WorkspaceId};

/// A task that time entries can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub project_id: ProjectId,
    pub name: String,
    /// Cached sum of finished entry durations, in seconds.
    #[serde(default)]
    pub tracked_seconds: i64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(
        id: TaskId,
        project_id: ProjectId,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            tracked_seconds: 0,
            date_created: now,
            date_updated: now,
        }
    }
}

/// A project that time entries can reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    /// Whether `estimated_hours` is maintained from tracked time.
    #[serde(default)]
    pub auto_estimates: bool,
    #[serde(default)]
    pub estimated_hours: f64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(
        id: ProjectId,
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        auto_estimates: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace_id,
            name: name.into(),
            auto_estimates,
            estimated_hours: 0.0,
            date_created: now,
            date_updated: now,
        }
    }
}
