//! Explicit aggregate recomputation for a task or project.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use tally_core::{AggregateWriter, IdGenerator, TimeEntryService, TimeEntryStore};

use crate::cli::SyncTarget;
use crate::commands::format::{format_duration, format_hours, write_json};

pub fn run<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    target: &SyncTarget,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    match target {
        SyncTarget::Task { id, output } => {
            let synced = service
                .sync_task_time(id, now)
                .with_context(|| format!("failed to sync task {id}"))?;
            tracing::info!(task_id = %synced.task_id, tracked_seconds = synced.tracked_seconds, "synced task");
            if output.json {
                return write_json(writer, &synced);
            }
            writeln!(
                writer,
                "Task {}: {} tracked",
                synced.task_id,
                format_duration(synced.tracked_seconds)
            )?;
        }
        SyncTarget::Project { id, output } => {
            let synced = service
                .sync_project_time(id, now)
                .with_context(|| format!("failed to sync project {id}"))?;
            tracing::info!(project_id = %synced.project_id, applied = synced.applied, "synced project");
            if output.json {
                return write_json(writer, &synced);
            }
            if synced.applied {
                writeln!(
                    writer,
                    "Project {}: {} estimated",
                    synced.project_id,
                    format_hours(synced.estimated_hours)
                )?;
            } else {
                writeln!(
                    writer,
                    "Project {}: automatic estimates are off, left unchanged ({} tracked)",
                    synced.project_id,
                    format_hours(synced.estimated_hours)
                )?;
            }
        }
    }
    Ok(())
}
