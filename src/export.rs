//! On-demand CSV and JSON export.
//!
//! Exports enumerate all tasks with resolved list names and human-readable
//! dates, written to a caller-supplied output. CSV escaping follows RFC 4180:
//! fields containing commas, quotes or line breaks are quoted, with embedded
//! quotes doubled, so a standard parser round-trips values unchanged.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{list, task};
use crate::utils::datetime;

/// Label used in exports for tasks not filed under any list.
pub const UNFILED_LIST_LABEL: &str = "(no list)";

const CSV_HEADER: &str =
    "id,title,description,list,completed,important,my_day,created_at,due_date,reminder_at";

/// One task flattened for export, with list name and dates resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub list: String,
    pub completed: bool,
    pub important: bool,
    pub my_day: bool,
    pub created_at: String,
    pub due_date: String,
    pub reminder_at: String,
}

/// Resolve tasks against their lists into export rows.
pub fn rows(
    lists: &[list::Model],
    tasks: &[task::Model],
    date_format: &str,
    datetime_format: &str,
) -> Vec<ExportedTask> {
    let names: HashMap<Uuid, &str> = lists.iter().map(|l| (l.id, l.name.as_str())).collect();

    tasks
        .iter()
        .map(|task| ExportedTask {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            list: task
                .list_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNFILED_LIST_LABEL)
                .to_string(),
            completed: task.is_completed,
            important: task.is_important,
            my_day: task.in_my_day,
            created_at: datetime::format_millis(task.created_at, datetime_format),
            due_date: datetime::format_opt_millis(task.due_date, date_format),
            reminder_at: datetime::format_opt_millis(task.reminder_at, datetime_format),
        })
        .collect()
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(mut out: W, rows: &[ExportedTask]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            csv_escape(&row.id),
            csv_escape(&row.title),
            csv_escape(&row.description),
            csv_escape(&row.list),
            row.completed,
            row.important,
            row.my_day,
            csv_escape(&row.created_at),
            csv_escape(&row.due_date),
            csv_escape(&row.reminder_at),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut out: W, rows: &[ExportedTask]) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, rows)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Quote a field when it contains a comma, quote or line break; embedded
/// quotes are doubled.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
