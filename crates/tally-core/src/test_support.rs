//! Shared fixtures for service tests.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::memory::MemoryStore;
use crate::records::{ProjectRecord, TaskRecord};
use crate::service::{EngineConfig, TimeEntryService};
use crate::store::SequentialIds;
use crate::time_entry::{EntryFields, NewTimeEntry};
use crate::types::{ProjectId, TaskId, WorkspaceId};

pub const OWNER: &str = "00000000-0000-0000-0000-0000000000a1";
pub const OTHER_OWNER: &str = "00000000-0000-0000-0000-0000000000a2";
pub const WORKSPACE: &str = "00000000-0000-0000-0000-0000000000b1";
pub const PROJECT: &str = "00000000-0000-0000-0000-0000000000c1";
pub const TASK: &str = "00000000-0000-0000-0000-0000000000d1";

/// 2021-10-01 at the given time, UTC.
pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 10, 1, hour, minute, second)
        .unwrap()
}

pub fn entry_fields() -> EntryFields {
    EntryFields {
        workspace_id: Some(WORKSPACE.to_string()),
        project_id: Some(PROJECT.to_string()),
        task_id: Some(TASK.to_string()),
        created_with: Some("API".to_string()),
        ..EntryFields::default()
    }
}

pub fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

pub fn new_entry(start: DateTime<Utc>, duration: i64) -> NewTimeEntry {
    NewTimeEntry {
        fields: entry_fields(),
        start: Some(start),
        duration: Some(duration),
    }
}

pub struct Fixture {
    pub service: TimeEntryService<MemoryStore, SequentialIds>,
}

impl Fixture {
    /// A service over a store holding [`TASK`] and [`PROJECT`] (auto estimates on).
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let workspace = WorkspaceId::parse(WORKSPACE).unwrap();
        let project = ProjectId::parse(PROJECT).unwrap();
        let mut store = MemoryStore::new();
        store.insert_project(ProjectRecord::new(
            project,
            workspace,
            "Backend",
            true,
            at(0, 0, 0),
        ));
        store.insert_task(TaskRecord::new(
            TaskId::parse(TASK).unwrap(),
            project,
            "Sync engine",
            at(0, 0, 0),
        ));
        let service = TimeEntryService::with_ids(store, SequentialIds::new()).with_config(config);
        Self { service }
    }

    pub fn add_task(&mut self, n: u128) -> TaskId {
        let id = TaskId::from_uuid(Uuid::from_u128(n));
        self.service.store_mut().insert_task(TaskRecord::new(
            id,
            ProjectId::parse(PROJECT).unwrap(),
            "Extra task",
            at(0, 0, 0),
        ));
        id
    }

    pub fn add_project(&mut self, n: u128, auto_estimates: bool) -> ProjectId {
        let id = ProjectId::from_uuid(Uuid::from_u128(n));
        self.service.store_mut().insert_project(ProjectRecord::new(
            id,
            WorkspaceId::parse(WORKSPACE).unwrap(),
            "Extra project",
            auto_estimates,
            at(0, 0, 0),
        ));
        id
    }

    pub fn task(&self) -> TaskRecord {
        self.task_by_id(TaskId::parse(TASK).unwrap())
    }

    pub fn project(&self) -> ProjectRecord {
        self.project_by_id(ProjectId::parse(PROJECT).unwrap())
    }

    pub fn task_by_id(&self, id: TaskId) -> TaskRecord {
        self.service.store().task(&id).cloned().unwrap()
    }

    pub fn project_by_id(&self, id: ProjectId) -> ProjectRecord {
        self.service.store().project(&id).cloned().unwrap()
    }
}
