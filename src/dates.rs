//! Due date handling
//!
//! Todos accept due dates as loosely formatted strings or as instants. This module
//! normalizes both into UTC instants and renders them back for storage and display.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Local date-time layouts accepted without an offset. They are read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// A due date as supplied by a caller, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DueDateInput {
    /// An already resolved instant
    Instant(DateTime<Utc>),
    /// Free-form text such as `2024-05-01` or an RFC 3339 timestamp
    Text(String),
}

impl DueDateInput {
    /// Resolves this input into an instant, or `None` when it carries no usable date
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            DueDateInput::Instant(at) => Some(at.trunc_subsecs(3)),
            DueDateInput::Text(text) => normalize_due_date(text),
        }
    }
}

impl From<DateTime<Utc>> for DueDateInput {
    fn from(at: DateTime<Utc>) -> Self {
        DueDateInput::Instant(at)
    }
}

impl From<NaiveDate> for DueDateInput {
    fn from(day: NaiveDate) -> Self {
        match day.and_hms_opt(0, 0, 0) {
            Some(midnight) => DueDateInput::Instant(midnight.and_utc()),
            None => DueDateInput::Text(day.to_string()),
        }
    }
}

impl From<&str> for DueDateInput {
    fn from(text: &str) -> Self {
        DueDateInput::Text(text.to_string())
    }
}

impl From<String> for DueDateInput {
    fn from(text: String) -> Self {
        DueDateInput::Text(text)
    }
}

/// Parses a due date string into a UTC instant with millisecond precision.
///
/// Empty input means "no due date". Date-only input resolves to midnight UTC.
/// Anything unparseable is treated like empty input.
pub fn normalize_due_date(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(at.with_timezone(&Utc).trunc_subsecs(3));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc().trunc_subsecs(3));
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }

    tracing::debug!(input = trimmed, "Ignoring unparseable due date");
    None
}

/// Renders a due date the way it is persisted: RFC 3339, milliseconds, `Z` suffix
pub fn to_iso_string(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde helper writing an optional due date as an ISO-8601 string or null
pub(crate) fn serialize_due_date<S>(due: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match due {
        Some(at) => serializer.serialize_str(&to_iso_string(at)),
        None => serializer.serialize_none(),
    }
}

/// Human readable due date line, e.g. `Due May 1, 2024`
pub fn format_due_date(due: Option<&DateTime<Utc>>) -> String {
    match due {
        Some(at) => format!("Due {}", at.format("%b %-d, %Y")),
        None => "No due date".to_string(),
    }
}

/// A todo is overdue when its due day is strictly before `today` and it is not completed
pub fn is_overdue(due: Option<&DateTime<Utc>>, completed: bool, today: NaiveDate) -> bool {
    if completed {
        return false;
    }
    due.map_or(false, |at| at.date_naive() < today)
}
