//! Storage layer for tally.
//!
//! Provides persistence for time entries and the task/project records whose
//! aggregates the engine maintains, using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Use separate `Database` instances per thread
//!
//! Each write runs in its own transaction. Aggregate sync reads a sum and
//! then writes it in a separate call, so two processes syncing the same task
//! concurrently can overwrite each other with a stale total.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with second precision
//! (e.g., `2021-10-01T08:00:00Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Running Entries
//!
//! A running entry stores `duration = -1` and a `NULL` stop. Aggregate sums
//! only count rows with `duration >= 0`.
//!
//! ## Associations
//!
//! `pid` and `tid` always hold an id. Entries without a project or task store
//! the all-zero sentinel, so there are no foreign keys on those columns.

mod entries;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use tally_core::{ProjectId, ProjectRecord, StoreError, TaskId, TaskRecord, WorkspaceId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A task or project lookup found no row.
    #[error("{table} row not found: {id}")]
    NotFound { table: &'static str, id: String },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row could not be mapped back to a domain value.
    #[error("invalid stored data for {record_id}: {message}")]
    InvalidRecord { record_id: String, message: String },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => Self::NotFound,
            other => Self::backend(other),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                name TEXT NOT NULL,
                auto_estimates INTEGER NOT NULL DEFAULT 0,
                estimated_hours REAL NOT NULL DEFAULT 0,
                date_created TEXT NOT NULL,
                date_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                tracked_seconds INTEGER NOT NULL DEFAULT 0,
                date_created TEXT NOT NULL,
                date_updated TEXT NOT NULL
            );

            -- Time entries: one row per recorded interval
            -- duration: seconds, or -1 while running (stop is NULL)
            -- tags: JSON array of strings
            CREATE TABLE IF NOT EXISTS time_entries (
                time_entry_id TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                uid TEXT NOT NULL,
                wid TEXT NOT NULL,
                pid TEXT NOT NULL,
                tid TEXT NOT NULL,
                billable INTEGER NOT NULL DEFAULT 0,
                start TEXT NOT NULL,
                stop TEXT,
                duration INTEGER NOT NULL,
                created_with TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                dur_only INTEGER NOT NULL DEFAULT 0,
                date_created TEXT NOT NULL,
                date_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_uid ON time_entries(uid);
            CREATE INDEX IF NOT EXISTS idx_time_entries_tid ON time_entries(tid);
            CREATE INDEX IF NOT EXISTS idx_time_entries_pid ON time_entries(pid);
            CREATE INDEX IF NOT EXISTS idx_time_entries_created ON time_entries(date_created);
            CREATE INDEX IF NOT EXISTS idx_time_entries_start ON time_entries(start);
            ",
        )?;
        Ok(())
    }

    /// Inserts a task record.
    pub fn insert_task(&mut self, task: &TaskRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO tasks (id, project_id, name, tracked_seconds, date_created, date_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.name,
                task.tracked_seconds,
                format_timestamp(task.date_created),
                format_timestamp(task.date_updated),
            ],
        )?;
        Ok(())
    }

    /// Loads a task record.
    pub fn get_task(&self, id: &TaskId) -> Result<TaskRecord, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, project_id, name, tracked_seconds, date_created, date_updated
                FROM tasks
                WHERE id = ?
                ",
                [id.to_string()],
                |row| {
                    Ok(TaskRow {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        name: row.get(2)?,
                        tracked_seconds: row.get(3)?,
                        date_created: row.get(4)?,
                        date_updated: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound {
                table: "tasks",
                id: id.to_string(),
            })?;
        row.into_record()
    }

    /// Inserts a project record.
    pub fn insert_project(&mut self, project: &ProjectRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO projects
            (id, workspace_id, name, auto_estimates, estimated_hours, date_created, date_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                project.id.to_string(),
                project.workspace_id.to_string(),
                project.name,
                project.auto_estimates,
                project.estimated_hours,
                format_timestamp(project.date_created),
                format_timestamp(project.date_updated),
            ],
        )?;
        Ok(())
    }

    /// Loads a project record.
    pub fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, workspace_id, name, auto_estimates, estimated_hours, date_created, date_updated
                FROM projects
                WHERE id = ?
                ",
                [id.to_string()],
                |row| {
                    Ok(ProjectRow {
                        id: row.get(0)?,
                        workspace_id: row.get(1)?,
                        name: row.get(2)?,
                        auto_estimates: row.get(3)?,
                        estimated_hours: row.get(4)?,
                        date_created: row.get(5)?,
                        date_updated: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound {
                table: "projects",
                id: id.to_string(),
            })?;
        row.into_record()
    }
}

#[derive(Debug)]
struct TaskRow {
    id: String,
    project_id: String,
    name: String,
    tracked_seconds: i64,
    date_created: String,
    date_updated: String,
}

impl TaskRow {
    fn into_record(self) -> Result<TaskRecord, DbError> {
        Ok(TaskRecord {
            id: parse_id(&self.id, &self.id)?,
            project_id: parse_id(&self.project_id, &self.id)?,
            name: self.name,
            tracked_seconds: self.tracked_seconds,
            date_created: parse_timestamp(&self.date_created, &self.id)?,
            date_updated: parse_timestamp(&self.date_updated, &self.id)?,
        })
    }
}

#[derive(Debug)]
struct ProjectRow {
    id: String,
    workspace_id: String,
    name: String,
    auto_estimates: bool,
    estimated_hours: f64,
    date_created: String,
    date_updated: String,
}

impl ProjectRow {
    fn into_record(self) -> Result<ProjectRecord, DbError> {
        Ok(ProjectRecord {
            id: parse_id(&self.id, &self.id)?,
            workspace_id: parse_id::<WorkspaceId>(&self.workspace_id, &self.id)?,
            name: self.name,
            auto_estimates: self.auto_estimates,
            estimated_hours: self.estimated_hours,
            date_created: parse_timestamp(&self.date_created, &self.id)?,
            date_updated: parse_timestamp(&self.date_updated, &self.id)?,
        })
    }
}

fn parse_id<T>(value: &str, record_id: &str) -> Result<T, DbError>
where
    T: std::str::FromStr<Err = tally_core::InvalidId>,
{
    value
        .parse()
        .map_err(|err: tally_core::InvalidId| DbError::InvalidRecord {
            record_id: record_id.to_string(),
            message: err.to_string(),
        })
}

fn parse_timestamp(timestamp: &str, record_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record_id: record_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        let entry_columns = table_columns(&db.conn, "time_entries");
        assert_eq!(
            entry_columns,
            vec![
                "time_entry_id",
                "description",
                "uid",
                "wid",
                "pid",
                "tid",
                "billable",
                "start",
                "stop",
                "duration",
                "created_with",
                "tags",
                "dur_only",
                "date_created",
                "date_updated",
            ]
        );

        let task_columns = table_columns(&db.conn, "tasks");
        assert_eq!(
            task_columns,
            vec![
                "id",
                "project_id",
                "name",
                "tracked_seconds",
                "date_created",
                "date_updated",
            ]
        );

        let project_columns = table_columns(&db.conn, "projects");
        assert_eq!(
            project_columns,
            vec![
                "id",
                "workspace_id",
                "name",
                "auto_estimates",
                "estimated_hours",
                "date_created",
                "date_updated",
            ]
        );

        let entry_indexes = index_names(&db.conn, "time_entries");
        let expected: HashSet<String> = [
            "idx_time_entries_uid",
            "idx_time_entries_tid",
            "idx_time_entries_pid",
            "idx_time_entries_created",
            "idx_time_entries_start",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert!(expected.is_subset(&entry_indexes));
    }

    #[test]
    fn test_init_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_task_and_project_records_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let workspace = WorkspaceId::from_uuid(Uuid::from_u128(1));
        let project = ProjectRecord::new(
            ProjectId::from_uuid(Uuid::from_u128(2)),
            workspace,
            "Backend",
            true,
            now(),
        );
        let task = TaskRecord::new(
            TaskId::from_uuid(Uuid::from_u128(3)),
            project.id,
            "Sync",
            now(),
        );
        db.insert_project(&project).unwrap();
        db.insert_task(&task).unwrap();

        assert_eq!(db.get_project(&project.id).unwrap(), project);
        assert_eq!(db.get_task(&task.id).unwrap(), task);
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .get_task(&TaskId::from_uuid(Uuid::from_u128(9)))
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { table: "tasks", .. }));
        assert!(matches!(StoreError::from(err), StoreError::NotFound));

        let err = db.get_project(&ProjectId::NONE).unwrap_err();
        assert!(matches!(err, DbError::NotFound { table: "projects", .. }));
    }

    #[test]
    fn test_corrupt_timestamps_surface_as_backend_errors() {
        let mut db = Database::open_in_memory().unwrap();
        let task = TaskRecord::new(
            TaskId::from_uuid(Uuid::from_u128(3)),
            ProjectId::NONE,
            "Sync",
            now(),
        );
        db.insert_task(&task).unwrap();
        db.conn
            .execute("UPDATE tasks SET date_updated = 'yesterday'", [])
            .unwrap();

        let err = db.get_task(&task.id).unwrap_err();
        assert!(matches!(err, DbError::TimestampParse { .. }));
        assert!(matches!(StoreError::from(err), StoreError::Backend(_)));
    }
}
