use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{NewTodo, Priority, TodoCreate, TodoPatch, TodoUpdate};

pub const TITLE_MAX: usize = 200;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_TOO_LONG: &str = "Title must be 200 characters or less";
pub const PRIORITY_INVALID: &str = "Priority must be one of: low, medium, high";
pub const DUE_DATE_INVALID: &str = "Due date must be a valid date";
pub const FILTER_INVALID: &str = "Filter must be one of: all, active, completed";
pub const BODY_INVALID: &str = "Request body must be a valid JSON todo";

/// Trimmed title, 1..=200 characters.
pub fn parse_title(raw: &str) -> Result<String, &'static str> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TITLE_REQUIRED);
    }
    if title.chars().count() > TITLE_MAX {
        return Err(TITLE_TOO_LONG);
    }
    Ok(title.to_string())
}

pub fn parse_priority(raw: &str) -> Result<Priority, &'static str> {
    Priority::parse(raw.trim()).ok_or(PRIORITY_INVALID)
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
/// Blank means no due date.
pub fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or(DUE_DATE_INVALID)
}

/// Empty descriptions are stored as absent.
fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.filter(|d| !d.trim().is_empty())
}

pub fn validate_create(input: TodoCreate) -> Result<NewTodo, &'static str> {
    let title = parse_title(&input.title)?;
    let priority = match input.priority.as_deref() {
        Some(p) if !p.trim().is_empty() => parse_priority(p)?,
        _ => Priority::default(),
    };
    let due_date = match input.due_date.as_deref() {
        Some(d) => parse_due_date(d)?,
        None => None,
    };
    Ok(NewTodo {
        title,
        description: normalize_description(input.description),
        priority,
        due_date,
    })
}

/// A blank priority leaves the stored one unchanged.
pub fn validate_update(input: TodoUpdate) -> Result<TodoPatch, &'static str> {
    let title = input.title.as_deref().map(parse_title).transpose()?;
    let priority = input
        .priority
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(parse_priority)
        .transpose()?;
    let due_date = match input.due_date {
        Some(Some(d)) => Some(parse_due_date(&d)?),
        Some(None) => Some(None),
        None => None,
    };
    Ok(TodoPatch {
        title,
        description: input.description.map(normalize_description),
        completed: input.completed,
        priority,
        due_date,
    })
}
