//! `SQLite` implementation of the entry store and aggregate writer.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use tally_core::{
    AggregateWriter, EntryId, PageRequest, ProjectId, StoreError, TaskId, TimeEntry,
    TimeEntryStore, UserId,
};

use crate::{Database, DbError, format_timestamp, parse_id, parse_timestamp};

const ENTRY_COLUMNS: &str = "time_entry_id, description, uid, wid, pid, tid, billable, start, \
     stop, duration, created_with, tags, dur_only, date_created, date_updated";

/// Raw column values, converted to a [`TimeEntry`] outside the row callback.
#[derive(Debug)]
struct EntryRow {
    id: String,
    description: String,
    uid: String,
    wid: String,
    pid: String,
    tid: String,
    billable: bool,
    start: String,
    stop: Option<String>,
    duration: i64,
    created_with: String,
    tags: String,
    dur_only: bool,
    date_created: String,
    date_updated: String,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            uid: row.get(2)?,
            wid: row.get(3)?,
            pid: row.get(4)?,
            tid: row.get(5)?,
            billable: row.get(6)?,
            start: row.get(7)?,
            stop: row.get(8)?,
            duration: row.get(9)?,
            created_with: row.get(10)?,
            tags: row.get(11)?,
            dur_only: row.get(12)?,
            date_created: row.get(13)?,
            date_updated: row.get(14)?,
        })
    }

    fn into_entry(self) -> Result<TimeEntry, DbError> {
        let record_id = self.id.as_str();
        let tags: BTreeSet<String> =
            serde_json::from_str(&self.tags).map_err(|err| DbError::InvalidRecord {
                record_id: record_id.to_string(),
                message: format!("tags: {err}"),
            })?;
        let stop = self
            .stop
            .as_deref()
            .map(|stop| parse_timestamp(stop, record_id))
            .transpose()?;

        Ok(TimeEntry {
            id: parse_id(record_id, record_id)?,
            description: self.description,
            user_id: parse_id(&self.uid, record_id)?,
            workspace_id: parse_id(&self.wid, record_id)?,
            project_id: parse_id(&self.pid, record_id)?,
            task_id: parse_id(&self.tid, record_id)?,
            billable: self.billable,
            start: parse_timestamp(&self.start, record_id)?,
            stop,
            duration: self.duration,
            created_with: self.created_with,
            tags,
            duration_only: self.dur_only,
            date_created: parse_timestamp(&self.date_created, record_id)?,
            date_updated: parse_timestamp(&self.date_updated, record_id)?,
        })
    }
}

fn tags_json(entry: &TimeEntry) -> Result<String, DbError> {
    serde_json::to_string(&entry.tags).map_err(|err| DbError::InvalidRecord {
        record_id: entry.id.to_string(),
        message: format!("tags: {err}"),
    })
}

fn sql_limit(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Database {
    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<TimeEntry>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, EntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    fn sum_durations(&self, column: &str, id: &str) -> Result<i64, DbError> {
        let total = self.conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(duration), 0) FROM time_entries \
                 WHERE {column} = ? AND duration >= 0"
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

impl TimeEntryStore for Database {
    fn insert_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError> {
        let tags = tags_json(entry)?;
        let tx = self.conn.transaction().map_err(DbError::from)?;
        tx.execute(
            &format!(
                "INSERT INTO time_entries ({ENTRY_COLUMNS}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                entry.id.to_string(),
                entry.description,
                entry.user_id.to_string(),
                entry.workspace_id.to_string(),
                entry.project_id.to_string(),
                entry.task_id.to_string(),
                entry.billable,
                format_timestamp(entry.start),
                entry.stop.map(format_timestamp),
                entry.duration,
                entry.created_with,
                tags,
                entry.duration_only,
                format_timestamp(entry.date_created),
                format_timestamp(entry.date_updated),
            ],
        )
        .map_err(DbError::from)?;
        tx.commit().map_err(DbError::from)?;
        Ok(())
    }

    fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE time_entry_id = ?"),
                [id.to_string()],
                EntryRow::from_row,
            )
            .optional()
            .map_err(DbError::from)?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into_entry()?)
    }

    fn update_entry(&mut self, entry: &TimeEntry) -> Result<(), StoreError> {
        let tags = tags_json(entry)?;
        let tx = self.conn.transaction().map_err(DbError::from)?;
        let changed = tx
            .execute(
                "
                UPDATE time_entries
                SET description = ?, uid = ?, wid = ?, pid = ?, tid = ?, billable = ?,
                    start = ?, stop = ?, duration = ?, created_with = ?, tags = ?,
                    dur_only = ?, date_created = ?, date_updated = ?
                WHERE time_entry_id = ?
                ",
                params![
                    entry.description,
                    entry.user_id.to_string(),
                    entry.workspace_id.to_string(),
                    entry.project_id.to_string(),
                    entry.task_id.to_string(),
                    entry.billable,
                    format_timestamp(entry.start),
                    entry.stop.map(format_timestamp),
                    entry.duration,
                    entry.created_with,
                    tags,
                    entry.duration_only,
                    format_timestamp(entry.date_created),
                    format_timestamp(entry.date_updated),
                    entry.id.to_string(),
                ],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().map_err(DbError::from)?;
        Ok(())
    }

    fn delete_entry(&mut self, id: &EntryId) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(DbError::from)?;
        let changed = tx
            .execute(
                "DELETE FROM time_entries WHERE time_entry_id = ?",
                [id.to_string()],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().map_err(DbError::from)?;
        Ok(())
    }

    fn list_running(&self, user: &UserId, page: PageRequest) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE uid = ? AND duration = -1 \
                 ORDER BY time_entry_id ASC LIMIT ? OFFSET ?"
            ),
            params![
                user.to_string(),
                sql_limit(page.limit()),
                sql_limit(page.offset())
            ],
        )?)
    }

    fn list_created_between(
        &self,
        user: &UserId,
        page: PageRequest,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE uid = ? AND date_created >= ? AND date_created <= ? \
                 ORDER BY time_entry_id ASC LIMIT ? OFFSET ?"
            ),
            params![
                user.to_string(),
                format_timestamp(from),
                format_timestamp(to),
                sql_limit(page.limit()),
                sql_limit(page.offset())
            ],
        )?)
    }

    fn list_stopped_between(
        &self,
        user: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE uid = ? AND stop IS NOT NULL AND stop >= ? AND stop <= ? \
                 ORDER BY duration ASC, time_entry_id ASC LIMIT ?"
            ),
            params![
                user.to_string(),
                format_timestamp(from),
                format_timestamp(to),
                sql_limit(limit)
            ],
        )?)
    }

    fn list_recent(&self, user: &UserId, limit: u64) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE uid = ? \
                 ORDER BY start DESC, time_entry_id ASC LIMIT ?"
            ),
            params![user.to_string(), sql_limit(limit)],
        )?)
    }

    fn sum_task_durations(&self, task: &TaskId) -> Result<i64, StoreError> {
        Ok(self.sum_durations("tid", &task.to_string())?)
    }

    fn sum_project_durations(&self, project: &ProjectId) -> Result<i64, StoreError> {
        Ok(self.sum_durations("pid", &project.to_string())?)
    }
}

impl AggregateWriter for Database {
    fn write_task_tracked(
        &mut self,
        task: &TaskId,
        tracked_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(DbError::from)?;
        let changed = tx
            .execute(
                "UPDATE tasks SET tracked_seconds = ?, date_updated = ? WHERE id = ?",
                params![tracked_seconds, format_timestamp(now), task.to_string()],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().map_err(DbError::from)?;
        Ok(())
    }

    fn write_project_estimate(
        &mut self,
        project: &ProjectId,
        estimated_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let tx = self.conn.transaction().map_err(DbError::from)?;
        let auto_estimates: bool = tx
            .query_row(
                "SELECT auto_estimates FROM projects WHERE id = ?",
                [project.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)?
            .ok_or(StoreError::NotFound)?;
        if !auto_estimates {
            return Ok(false);
        }
        tx.execute(
            "UPDATE projects SET estimated_hours = ?, date_updated = ? WHERE id = ?",
            params![estimated_hours, format_timestamp(now), project.to_string()],
        )
        .map_err(DbError::from)?;
        tx.commit().map_err(DbError::from)?;
        Ok(true)
    }
}
