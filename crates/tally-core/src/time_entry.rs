//! Time entries: single recorded (or in-progress) intervals of work.

use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{EntryId, ProjectId, TagMode, TaskId, UserId, ValidationError, WorkspaceId};

/// Duration value marking a running entry.
pub const RUNNING_DURATION: i64 = -1;

/// Whether an entry is still being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Started but not stopped: `duration == -1`, no stop timestamp.
    Running,
    /// Finished: `stop == start + duration`.
    Stopped,
}

/// A recorded interval of work.
///
/// A running entry has `duration == RUNNING_DURATION` and no `stop`. A
/// stopped entry has `stop == start + duration`. Every constructor and
/// mutation in this module keeps that pairing intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    #[serde(default)]
    pub description: String,
    pub user_id: UserId,
    pub workspace_id: WorkspaceId,
    /// [`ProjectId::NONE`] when the entry has no project.
    #[serde(default)]
    pub project_id: ProjectId,
    /// [`TaskId::NONE`] when the entry has no task.
    #[serde(default)]
    pub task_id: TaskId,
    #[serde(default)]
    pub billable: bool,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Utc>>,
    /// Seconds, or [`RUNNING_DURATION`].
    pub duration: i64,
    /// Free-text identifier of the client that created the entry.
    pub created_with: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// The UI should show only the duration, not a stop clock.
    #[serde(default)]
    pub duration_only: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Descriptive fields supplied when creating or starting an entry.
///
/// IDs arrive as raw strings and are parsed during validation so malformed
/// values surface as [`crate::types::InvalidId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFields {
    pub description: Option<String>,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub billable: bool,
    pub created_with: Option<String>,
    pub tags: Option<Vec<String>>,
    pub duration_only: bool,
}

/// Input for creating a finished entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTimeEntry {
    #[serde(flatten)]
    pub fields: EntryFields,
    pub start: Option<DateTime<Utc>>,
    /// Seconds.
    pub duration: Option<i64>,
}

/// A partial update. Only fields that are `Some` are applied.
///
/// For `project_id`/`task_id`, sending an empty string clears the
/// association back to the sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeEntryPatch {
    pub description: Option<String>,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub billable: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub duration_only: Option<bool>,
}

impl TimeEntryPatch {
    /// Returns true if the patch supplies no fields at all.
    pub const fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.workspace_id.is_none()
            && self.project_id.is_none()
            && self.task_id.is_none()
            && self.billable.is_none()
            && self.start.is_none()
            && self.stop.is_none()
            && self.tags.is_none()
            && self.duration_only.is_none()
    }
}

/// Validated descriptive fields shared by both creation paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryDetails {
    description: String,
    workspace_id: WorkspaceId,
    project_id: ProjectId,
    task_id: TaskId,
    billable: bool,
    created_with: String,
    tags: BTreeSet<String>,
    duration_only: bool,
}

impl EntryDetails {
    pub(crate) fn validate(fields: &EntryFields) -> Result<Self, EngineError> {
        let workspace_id = fields
            .workspace_id
            .as_deref()
            .ok_or(ValidationError::Missing {
                field: "workspace_id",
            })?;
        let workspace_id = WorkspaceId::parse(workspace_id)?;
        let project_id = ProjectId::parse_or_none(fields.project_id.as_deref())?;
        let task_id = TaskId::parse_or_none(fields.task_id.as_deref())?;
        let created_with = required_text(fields.created_with.as_deref(), "created_with")?;

        Ok(Self {
            description: fields.description.clone().unwrap_or_default(),
            workspace_id,
            project_id,
            task_id,
            billable: fields.billable,
            created_with,
            tags: normalize_tags(fields.tags.as_deref().unwrap_or_default()),
            duration_only: fields.duration_only,
        })
    }
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing { field })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value.to_string())
}

/// Trims tags, drops blanks, and deduplicates.
pub fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncates a timestamp to whole seconds.
///
/// Durations are stored in seconds, so every instant the engine records is
/// truncated first to keep `stop - start == duration` exact.
pub fn whole_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(0)
}

/// `0000-01-01T00:00:00Z`, the earliest instant with a four-digit year.
const MIN_STORABLE_SECS: i64 = -62_167_219_200;
/// `9999-12-31T23:59:59Z`, the latest instant with a four-digit year.
const MAX_STORABLE_SECS: i64 = 253_402_300_799;

/// Returns true if `timestamp` formats as RFC 3339 with a four-digit year.
///
/// Stores keep timestamps as RFC 3339 text and compare them as strings, so
/// every instant the engine records must stay within years 0000 to 9999.
pub fn is_storable(timestamp: DateTime<Utc>) -> bool {
    (MIN_STORABLE_SECS..=MAX_STORABLE_SECS).contains(&timestamp.timestamp())
}

/// Clamps a query bound into the storable range.
pub fn clamp_storable(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let secs = timestamp
        .timestamp()
        .clamp(MIN_STORABLE_SECS, MAX_STORABLE_SECS);
    if secs == timestamp.timestamp() {
        timestamp
    } else {
        DateTime::from_timestamp(secs, 0).unwrap_or(timestamp)
    }
}

fn storable(
    timestamp: DateTime<Utc>,
    field: &'static str,
) -> Result<DateTime<Utc>, ValidationError> {
    if is_storable(timestamp) {
        Ok(timestamp)
    } else {
        Err(ValidationError::TimestampOutOfRange {
            field,
            value: timestamp,
        })
    }
}

fn interval_seconds(start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<i64, ValidationError> {
    if stop < start {
        return Err(ValidationError::StopBeforeStart { start, stop });
    }
    Ok(stop.signed_duration_since(start).num_seconds())
}

impl TimeEntry {
    /// Builds a finished entry from an explicit start and duration.
    pub(crate) fn finished(
        id: EntryId,
        user_id: UserId,
        details: EntryDetails,
        start: DateTime<Utc>,
        duration: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if duration < 0 {
            return Err(ValidationError::NegativeDuration { value: duration });
        }
        let start = storable(whole_seconds(start), "start")?;
        let stop = TimeDelta::try_seconds(duration)
            .and_then(|delta| start.checked_add_signed(delta))
            .filter(|stop| is_storable(*stop))
            .ok_or(ValidationError::DurationOutOfRange {
                start,
                value: duration,
            })?;
        Ok(Self::assemble(
            id,
            user_id,
            details,
            start,
            Some(stop),
            duration,
            now,
        ))
    }

    /// Builds a running entry that started at `now`.
    pub(crate) fn running(
        id: EntryId,
        user_id: UserId,
        details: EntryDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self::assemble(
            id,
            user_id,
            details,
            whole_seconds(now),
            None,
            RUNNING_DURATION,
            now,
        )
    }

    fn assemble(
        id: EntryId,
        user_id: UserId,
        details: EntryDetails,
        start: DateTime<Utc>,
        stop: Option<DateTime<Utc>>,
        duration: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let now = whole_seconds(now);
        Self {
            id,
            description: details.description,
            user_id,
            workspace_id: details.workspace_id,
            project_id: details.project_id,
            task_id: details.task_id,
            billable: details.billable,
            start,
            stop,
            duration,
            created_with: details.created_with,
            tags: details.tags,
            duration_only: details.duration_only,
            date_created: now,
            date_updated: now,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.duration == RUNNING_DURATION
    }

    #[must_use]
    pub const fn state(&self) -> EntryState {
        if self.is_running() {
            EntryState::Running
        } else {
            EntryState::Stopped
        }
    }

    /// Stops the entry at `now`.
    ///
    /// Applies to stopped entries as well: the stop clock moves to `now`.
    pub(crate) fn stop_at(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let now = storable(whole_seconds(now), "stop")?;
        let duration = interval_seconds(self.start, now)?;
        self.stop = Some(now);
        self.duration = duration;
        self.date_updated = now;
        Ok(())
    }

    /// Applies the supplied fields of `patch`.
    ///
    /// When `start` or `stop` is supplied the duration is re-derived from the
    /// resulting pair. A running entry that only receives a new `start` stays
    /// running. Nothing is modified if any field fails validation.
    pub(crate) fn apply_patch(
        &mut self,
        patch: &TimeEntryPatch,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let workspace_id = patch
            .workspace_id
            .as_deref()
            .map(WorkspaceId::parse)
            .transpose()?;
        let project_id = patch
            .project_id
            .as_deref()
            .map(|id| ProjectId::parse_or_none(Some(id)))
            .transpose()?;
        let task_id = patch
            .task_id
            .as_deref()
            .map(|id| TaskId::parse_or_none(Some(id)))
            .transpose()?;

        let interval = if patch.start.is_some() || patch.stop.is_some() {
            let start = match patch.start {
                Some(start) => storable(whole_seconds(start), "start")?,
                None => self.start,
            };
            let stop = match patch.stop {
                Some(stop) => Some(storable(whole_seconds(stop), "stop")?),
                None => self.stop,
            };
            let duration = match stop {
                Some(stop) => interval_seconds(start, stop)?,
                None => RUNNING_DURATION,
            };
            Some((start, stop, duration))
        } else {
            None
        };

        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(workspace_id) = workspace_id {
            self.workspace_id = workspace_id;
        }
        if let Some(project_id) = project_id {
            self.project_id = project_id;
        }
        if let Some(task_id) = task_id {
            self.task_id = task_id;
        }
        if let Some(billable) = patch.billable {
            self.billable = billable;
        }
        if let Some(tags) = &patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(duration_only) = patch.duration_only {
            self.duration_only = duration_only;
        }
        if let Some((start, stop, duration)) = interval {
            self.start = start;
            self.stop = stop;
            self.duration = duration;
        }
        self.date_updated = whole_seconds(now);
        Ok(())
    }

    /// Adds or removes tags.
    pub(crate) fn edit_tags(&mut self, tags: &[String], mode: TagMode, now: DateTime<Utc>) {
        let tags = normalize_tags(tags);
        match mode {
            TagMode::Add => self.tags.extend(tags),
            TagMode::Remove => self.tags.retain(|tag| !tags.contains(tag)),
        }
        self.date_updated = whole_seconds(now);
    }
}
