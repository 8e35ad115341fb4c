//! Entry lifecycle commands: create, start, stop, update, delete and tag.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;

use tally_core::{
    AggregateWriter, BatchOutcome, IdGenerator, NewTimeEntry, TimeEntry, TimeEntryPatch,
    TimeEntryService, TimeEntryStore,
};

use crate::Config;
use crate::cli::{CreateArgs, DeleteArgs, StartArgs, StopArgs, TagArgs, UpdateArgs};
use crate::commands::format::{write_entry_detail, write_entry_line, write_json};
use crate::commands::util::{entry_fields, parse_datetime};

pub fn create<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &CreateArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let owner = config.owner()?;
    let input = NewTimeEntry {
        fields: entry_fields(&args.entry, config),
        start: Some(parse_datetime(&args.start, now)?),
        duration: Some(args.duration),
    };
    let entry = service
        .create(&input, owner, now)
        .context("failed to create time entry")?;
    tracing::info!(entry_id = %entry.id, duration = entry.duration, "created time entry");

    if args.output.json {
        return write_json(writer, &entry);
    }
    write!(writer, "Created ")?;
    write_entry_line(writer, &entry, &config.date_format)
}

pub fn start<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &StartArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let owner = config.owner()?;
    let entry = service
        .start(&entry_fields(&args.entry, config), owner, now)
        .context("failed to start timer")?;
    tracing::info!(entry_id = %entry.id, "started timer");

    if args.output.json {
        return write_json(writer, &entry);
    }
    write!(writer, "Started ")?;
    write_entry_line(writer, &entry, &config.date_format)
}

pub fn stop<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &StopArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let at = match &args.at {
        Some(at) => parse_datetime(at, now)?,
        None => now,
    };
    let entry = service
        .stop(&args.id, at)
        .with_context(|| format!("failed to stop time entry {}", args.id))?;
    tracing::info!(entry_id = %entry.id, duration = entry.duration, "stopped timer");

    if args.output.json {
        return write_json(writer, &entry);
    }
    write!(writer, "Stopped ")?;
    write_entry_line(writer, &entry, &config.date_format)
}

pub fn update<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &UpdateArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let patch = TimeEntryPatch {
        description: args.description.clone(),
        workspace_id: args.workspace.clone(),
        project_id: args.project.clone(),
        task_id: args.task.clone(),
        billable: args.billable,
        start: args
            .start
            .as_deref()
            .map(|start| parse_datetime(start, now))
            .transpose()?,
        stop: args
            .stop
            .as_deref()
            .map(|stop| parse_datetime(stop, now))
            .transpose()?,
        tags: args.tags.clone(),
        duration_only: args.duration_only,
    };
    if patch.is_empty() {
        bail!("nothing to update: pass at least one field to change");
    }

    let outcome = service.update_batch(&args.ids, &patch, now);
    write_batch(writer, &outcome, args.output.json, config, "updated")
}

pub fn delete<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &DeleteArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let entry = service
        .delete(&args.id, now)
        .with_context(|| format!("failed to delete time entry {}", args.id))?;
    tracing::info!(entry_id = %entry.id, "deleted time entry");

    if args.output.json {
        return write_json(writer, &entry);
    }
    writeln!(writer, "Deleted time entry {}", entry.id)?;
    write_entry_detail(writer, &entry, &config.date_format)
}

pub fn tag<W, S, G>(
    writer: &mut W,
    service: &mut TimeEntryService<S, G>,
    args: &TagArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let outcome = service.update_tags_batch(&args.ids, &args.tags, args.mode, now);
    write_batch(writer, &outcome, args.output.json, config, "tagged")
}

#[derive(Debug, Serialize)]
struct BatchReport<'a> {
    updated: Vec<&'a TimeEntry>,
    failed: Vec<BatchFailure>,
}

#[derive(Debug, Serialize)]
struct BatchFailure {
    id: String,
    error: String,
}

/// Reports every per-id result, then fails if any id failed.
fn write_batch<W: Write>(
    writer: &mut W,
    outcome: &BatchOutcome,
    json: bool,
    config: &Config,
    verb: &str,
) -> Result<()> {
    if outcome.items.is_empty() {
        bail!("no time entry IDs given");
    }

    if json {
        let report = BatchReport {
            updated: outcome.succeeded().collect(),
            failed: outcome
                .failed()
                .map(|(id, err)| BatchFailure {
                    id: id.to_string(),
                    error: err.to_string(),
                })
                .collect(),
        };
        write_json(writer, &report)?;
    } else {
        for entry in outcome.succeeded() {
            write!(writer, "{} ", capitalize(verb))?;
            write_entry_line(writer, entry, &config.date_format)?;
        }
        for (id, err) in outcome.failed() {
            writeln!(writer, "Failed {id}: {err}")?;
        }
    }

    let failed = outcome.failed().count();
    if failed > 0 {
        bail!(
            "{failed} of {} time entries could not be {verb}",
            outcome.items.len()
        );
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
