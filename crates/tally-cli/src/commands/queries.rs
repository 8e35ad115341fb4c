//! Read-only entry commands: show, running, range and dash.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use tally_core::{AggregateWriter, IdGenerator, PageRequest, TimeEntryService, TimeEntryStore};

use crate::Config;
use crate::cli::{OutputArgs, PageArgs, RangeArgs, RunningArgs, ShowArgs};
use crate::commands::format::{write_entry_detail, write_entry_list, write_json};
use crate::commands::util::parse_datetime;

fn page_request(args: PageArgs) -> Result<PageRequest> {
    PageRequest::new(args.page, args.page_size).context("invalid paging")
}

pub fn show<W, S, G>(
    writer: &mut W,
    service: &TimeEntryService<S, G>,
    args: &ShowArgs,
    config: &Config,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let entry = service
        .get(&args.id)
        .with_context(|| format!("failed to load time entry {}", args.id))?;
    if args.output.json {
        return write_json(writer, &entry);
    }
    write_entry_detail(writer, &entry, &config.date_format)
}

pub fn running<W, S, G>(
    writer: &mut W,
    service: &TimeEntryService<S, G>,
    args: &RunningArgs,
    config: &Config,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let entries = service
        .running(config.owner()?, page_request(args.page)?)
        .context("failed to list running timers")?;
    if args.output.json {
        return write_json(writer, &entries);
    }
    write_entry_list(writer, &entries, &config.date_format, "No running timers.")
}

pub fn range<W, S, G>(
    writer: &mut W,
    service: &TimeEntryService<S, G>,
    args: &RangeArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let from = parse_datetime(&args.from, now)?;
    let to = match &args.to {
        Some(to) => parse_datetime(to, now)?,
        None => now,
    };
    let entries = service
        .range(config.owner()?, page_request(args.page)?, from, to)
        .context("failed to list time entries")?;
    if args.output.json {
        return write_json(writer, &entries);
    }
    write_entry_list(
        writer,
        &entries,
        &config.date_format,
        "No time entries in range.",
    )
}

pub fn dash<W, S, G>(
    writer: &mut W,
    service: &TimeEntryService<S, G>,
    args: OutputArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    S: TimeEntryStore + AggregateWriter,
    G: IdGenerator,
{
    let dashboard = service
        .dashboard(config.owner()?, now)
        .context("failed to load dashboard")?;
    if args.json {
        return write_json(writer, &dashboard);
    }

    writeln!(writer, "Most active (last 7 days):")?;
    write_entry_list(
        writer,
        &dashboard.most_active,
        &config.date_format,
        "  (none)",
    )?;
    writeln!(writer)?;
    writeln!(writer, "Recent activity:")?;
    write_entry_list(writer, &dashboard.recent, &config.date_format, "  (none)")
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;
    use tally_core::{EntryFields, NewTimeEntry, SequentialIds};
    use tally_db::Database;

    const OWNER: &str = "00000000-0000-0000-0000-0000000000a1";
    const WORKSPACE: &str = "00000000-0000-0000-0000-0000000000b1";

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, hour, minute, 0).unwrap()
    }

    fn config() -> Config {
        Config {
            user_id: Some(OWNER.to_string()),
            workspace_id: Some(WORKSPACE.to_string()),
            date_format: "%H:%M".to_string(),
            ..Config::default()
        }
    }

    fn fields(description: &str) -> EntryFields {
        EntryFields {
            description: Some(description.to_string()),
            workspace_id: Some(WORKSPACE.to_string()),
            created_with: Some("API".to_string()),
            ..EntryFields::default()
        }
    }

    /// Two finished entries and one running timer.
    fn service() -> TimeEntryService<Database, SequentialIds> {
        let db = Database::open_in_memory().unwrap();
        let mut svc = TimeEntryService::with_ids(db, SequentialIds::new());
        for (hour, duration, description) in [(8, 3600, "Planning"), (9, 900, "Standup")] {
            svc.create(
                &NewTimeEntry {
                    fields: fields(description),
                    start: Some(at(hour, 0)),
                    duration: Some(duration),
                },
                OWNER,
                at(hour, 0),
            )
            .unwrap();
        }
        svc.start(&fields("Review"), OWNER, at(10, 0)).unwrap();
        svc
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut output = Vec::new();
        f(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_dash_lists_both_sections() {
        let svc = service();
        let output = render(|w| dash(w, &svc, OutputArgs::default(), &config(), at(12, 0)));
        assert_snapshot!(output, @r"
        Most active (last 7 days):
        00000000-0000-0000-0000-000000000002  09:00 - 09:15       15m  Standup
        00000000-0000-0000-0000-000000000001  08:00 - 09:00     1h 0m  Planning

        Recent activity:
        00000000-0000-0000-0000-000000000003  10:00 - ...   running  Review
        00000000-0000-0000-0000-000000000002  09:00 - 09:15       15m  Standup
        00000000-0000-0000-0000-000000000001  08:00 - 09:00     1h 0m  Planning
        ");
    }

    #[test]
    fn test_running_lists_only_open_timers() {
        let svc = service();
        let args = RunningArgs {
            page: PageArgs {
                page: 1,
                page_size: 50,
            },
            output: OutputArgs { json: true },
        };
        let output = render(|w| running(w, &svc, &args, &config()));
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["description"], "Review");
        assert_eq!(entries[0]["duration"], -1);
        assert!(entries[0]["stop"].is_null());
    }

    #[test]
    fn test_range_pages_are_disjoint() {
        let svc = service();
        let page = |n| RangeArgs {
            from: "2021-10-01T00:00:00Z".to_string(),
            to: None,
            page: PageArgs {
                page: n,
                page_size: 1,
            },
            output: OutputArgs::default(),
        };

        let first = render(|w| range(w, &svc, &page(1), &config(), at(12, 0)));
        let second = render(|w| range(w, &svc, &page(2), &config(), at(12, 0)));
        assert_snapshot!(first.trim_end(), @"00000000-0000-0000-0000-000000000001  08:00 - 09:00     1h 0m  Planning");
        assert_snapshot!(second.trim_end(), @"00000000-0000-0000-0000-000000000002  09:00 - 09:15       15m  Standup");
    }

    #[test]
    fn test_range_with_zero_page_size_is_rejected() {
        let svc = service();
        let args = RangeArgs {
            from: "1 day ago".to_string(),
            to: None,
            page: PageArgs {
                page: 1,
                page_size: 0,
            },
            output: OutputArgs::default(),
        };
        let err = range(&mut std::io::sink(), &svc, &args, &config(), at(12, 0)).unwrap_err();
        assert!(err.to_string().contains("invalid paging"));
    }

    #[test]
    fn test_show_missing_entry_fails() {
        let svc = service();
        let args = ShowArgs {
            id: "00000000-0000-0000-0000-0000000000ff".to_string(),
            output: OutputArgs::default(),
        };
        let err = show(&mut std::io::sink(), &svc, &args, &config()).unwrap_err();
        assert!(format!("{err:#}").contains("time entry not found"));
    }

    #[test]
    fn test_show_prints_detail() {
        let svc = service();
        let args = ShowArgs {
            id: "00000000-0000-0000-0000-000000000001".to_string(),
            output: OutputArgs::default(),
        };
        let output = render(|w| show(w, &svc, &args, &config()));
        assert_snapshot!(output, @r"
        Entry:        00000000-0000-0000-0000-000000000001
        Description:  Planning
        State:        Stopped
        Start:        08:00
        Stop:         09:00
        Duration:     1h 0m
        Workspace:    00000000-0000-0000-0000-0000000000b1
        Billable:     no
        Created with: API
        ");
    }
}
