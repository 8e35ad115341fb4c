//! Human-readable and JSON rendering shared by the commands.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use tally_core::TimeEntry;

/// Formats seconds as "Xh Ym", "Ym" or "Zs".
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "running".to_string();
    }
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats fractional hours with two decimals.
pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}h")
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// One line per entry: id, interval, duration, description and tags.
pub fn write_entry_line<W: Write>(
    writer: &mut W,
    entry: &TimeEntry,
    date_format: &str,
) -> Result<()> {
    write!(writer, "{}  {}", entry.id, entry.start.format(date_format))?;
    match entry.stop {
        Some(stop) => write!(writer, " - {}", stop.format(date_format))?,
        None => write!(writer, " - ...")?,
    }
    write!(writer, "  {:>8}", format_duration(entry.duration))?;
    if !entry.description.is_empty() {
        write!(writer, "  {}", entry.description)?;
    }
    if !entry.tags.is_empty() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        write!(writer, "  [{}]", tags.join(", "))?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Writes each entry on its own line, or `empty` when there are none.
pub fn write_entry_list<W: Write>(
    writer: &mut W,
    entries: &[TimeEntry],
    date_format: &str,
    empty: &str,
) -> Result<()> {
    if entries.is_empty() {
        writeln!(writer, "{empty}")?;
        return Ok(());
    }
    for entry in entries {
        write_entry_line(writer, entry, date_format)?;
    }
    Ok(())
}

/// Full field listing for a single entry.
pub fn write_entry_detail<W: Write>(
    writer: &mut W,
    entry: &TimeEntry,
    date_format: &str,
) -> Result<()> {
    writeln!(writer, "Entry:        {}", entry.id)?;
    if !entry.description.is_empty() {
        writeln!(writer, "Description:  {}", entry.description)?;
    }
    writeln!(writer, "State:        {:?}", entry.state())?;
    writeln!(writer, "Start:        {}", entry.start.format(date_format))?;
    if let Some(stop) = entry.stop {
        writeln!(writer, "Stop:         {}", stop.format(date_format))?;
    }
    writeln!(writer, "Duration:     {}", format_duration(entry.duration))?;
    writeln!(writer, "Workspace:    {}", entry.workspace_id)?;
    if !entry.project_id.is_none() {
        writeln!(writer, "Project:      {}", entry.project_id)?;
    }
    if !entry.task_id.is_none() {
        writeln!(writer, "Task:         {}", entry.task_id)?;
    }
    writeln!(
        writer,
        "Billable:     {}",
        if entry.billable { "yes" } else { "no" }
    )?;
    if !entry.tags.is_empty() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        writeln!(writer, "Tags:         {}", tags.join(", "))?;
    }
    writeln!(writer, "Created with: {}", entry.created_with)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_cases() {
        assert_eq!(format_duration(-1), "running");
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(28_800), "8h 0m");
    }

    #[test]
    fn test_format_hours_rounds_to_two_places() {
        assert_eq!(format_hours(8.0), "8.00h");
        assert_eq!(format_hours(1.0 / 3.0), "0.33h");
    }
}
