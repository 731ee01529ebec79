//! Natural-language task extraction.
//!
//! Turns a free-form sentence such as
//! "Create a high priority task to review the PR by tomorrow evening"
//! into a [`ParsedTask`]. Every stage is a pure function of the input text
//! and the supplied reference time.

pub mod attributes;
pub mod date;
pub mod time;
pub mod title;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::task::{Priority, Status};

/// Result of parsing one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub status: Status,
}

/// The input in both the shapes the rules need: lower-cased for keyword
/// matching, original case for the title and month-name patterns.
#[derive(Debug, Clone)]
pub struct Utterance<'a> {
    pub original: &'a str,
    pub lower: String,
}

impl<'a> Utterance<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            original: text,
            lower: text.to_lowercase(),
        }
    }
}

/// Parse `text` relative to `now`. Total over all inputs.
pub fn parse(text: &str, now: NaiveDateTime) -> ParsedTask {
    let input = Utterance::new(text);

    let priority = attributes::extract_priority(&input.lower);
    let status = attributes::extract_status(&input.lower);

    let due_date = date::resolve_date(&input, now).map(|day| time::apply_time(&input.lower, day));

    let title = title::clean_title(input.original);

    tracing::debug!(
        %priority,
        %status,
        due_date = ?due_date,
        title = %title,
        "Parsed task text"
    );

    ParsedTask {
        title,
        priority,
        due_date,
        status,
    }
}
