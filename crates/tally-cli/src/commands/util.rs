//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

use tally_core::EntryFields;

use crate::Config;
use crate::cli::EntryArgs;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(second|minute|hour|day|week)s?\s+ago$").expect("valid regex literal")
});

/// Conservative bounds for relative time parsing (~1000 years in seconds).
const MAX_RELATIVE_SECONDS: i64 = 1000 * 365 * 24 * 60 * 60;

/// Parse a datetime string as either ISO 8601 or time relative to `now`.
///
/// Supports:
/// - ISO 8601: "2021-10-01T08:00:00Z"
/// - Relative: "45 seconds ago", "2 hours ago", "1 day ago", "1 week ago"
/// - "now"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2021-10-01T08:00:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let seconds_per_unit = match &caps[2] {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 60 * 60 * 24,
        "week" => 60 * 60 * 24 * 7,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_SECONDS / seconds_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - TimeDelta::seconds(n * seconds_per_unit))
}

/// Builds engine fields from command-line arguments and config defaults.
pub fn entry_fields(args: &EntryArgs, config: &Config) -> EntryFields {
    EntryFields {
        description: args.description.clone(),
        workspace_id: args
            .workspace
            .clone()
            .or_else(|| config.workspace_id.clone()),
        project_id: args.project.clone(),
        task_id: args.task.clone(),
        billable: args.billable,
        created_with: Some(
            args.created_with
                .clone()
                .unwrap_or_else(|| config.created_with.clone()),
        ),
        tags: (!args.tags.is_empty()).then(|| args.tags.clone()),
        duration_only: args.duration_only,
    }
}
