use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Storage and wire format for due dates (local wall-clock time, no offset).
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Strict lookup, used for user-supplied filters.
    pub fn parse_tag(s: &str) -> Option<Self> {
        match s {
            "URGENT" => Some(Self::Urgent),
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }

    /// Lenient lookup for stored rows. Unknown tags fall back to MEDIUM.
    pub fn from_str_tag(s: &str) -> Self {
        Self::parse_tag(s).unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    /// Board column heading.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn parse_tag(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(Self::Todo),
            "IN_PROGRESS" => Some(Self::InProgress),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn from_str_tag(s: &str) -> Self {
        Self::parse_tag(s).unwrap_or_default()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of a create request. Dates arrive as loosely formatted strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
}

/// Body of a partial update. `dueDate: null` clears the date, a missing key
/// leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<String>>,
}

/// Query string of `GET /tasks`. Kept as raw strings so bad values can be
/// reported as validation errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub search: Option<String>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Parse a due date supplied by a client.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS]`, a bare `YYYY-MM-DD` (midnight) and RFC 3339
/// with an offset, which is converted to local time. Empty strings and the
/// literal `"null"` mean no date.
pub fn parse_due_date(raw: &str) -> Result<Option<NaiveDateTime>, AppError> {
    let s = raw.trim();
    if s.is_empty() || s == "null" {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&Local).naive_local()));
    }
    for fmt in [DUE_DATE_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Some(dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0));
    }

    Err(AppError::Validation(format!("Invalid due date: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip_through_serde() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(serde_json::to_string(&Priority::Urgent).unwrap(), "\"URGENT\"");
        let s: Status = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(s, Status::Done);
    }

    #[test]
    fn test_from_str_tag_defaults() {
        assert_eq!(Priority::from_str_tag("bogus"), Priority::Medium);
        assert_eq!(Status::from_str_tag(""), Status::Todo);
        assert_eq!(Status::parse_tag("todo"), None);
        assert_eq!(Status::InProgress.label(), "In Progress");
    }

    #[test]
    fn test_parse_due_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 11)
            .unwrap()
            .and_hms_opt(18, 0, 0);
        assert_eq!(parse_due_date("2025-01-11T18:00:00").unwrap(), expected);
        assert_eq!(parse_due_date("2025-01-11T18:00").unwrap(), expected);
        assert_eq!(
            parse_due_date("2025-01-11").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 11).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_due_date("2025-01-11T18:00:00Z").unwrap().is_some());
        assert_eq!(parse_due_date("").unwrap(), None);
        assert_eq!(parse_due_date("null").unwrap(), None);
        assert!(matches!(parse_due_date("next week"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let cleared: TaskUpdate = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let untouched: TaskUpdate = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(untouched.due_date, None);
    }
}
