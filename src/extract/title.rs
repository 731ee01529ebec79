use once_cell::sync::Lazy;
use regex::Regex;

use super::date::{ABSOLUTE_DATE_RES, IN_N_UNITS_RE, WEEKDAYS};
use super::time::{CLOCK_RE, DAY_PARTS};

const PRIORITY_QUALIFIER: &str = r"(?:(?:high|low)\s+priority\s+|urgent\s+|critical\s+)?";

/// Removal rules, applied top to bottom. Later rules assume the earlier ones
/// already ran.
static REMOVALS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let weekdays = WEEKDAYS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|");
    let day_parts = DAY_PARTS
        .iter()
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join("|");

    let mut rules: Vec<Regex> = [
        // leading commands
        format!(
            r"(?i)^\s*(?:create|add|make|start)\s+(?:an?\s+)?(?:new\s+)?{PRIORITY_QUALIFIER}(?:task|todo|item)\b\s*(?:to\b|for\b|:)?"
        ),
        r"(?i)^\s*(?:remind|tell|ask)\s+(?:me\s+)?(?:to\b)?".to_string(),
        format!(r"(?i)^\s*{PRIORITY_QUALIFIER}(?:task|todo|item)\s*:"),
        // priority
        r"(?i)high priority|low priority|urgent|critical".to_string(),
        // status
        r"(?i)in progress|done|completed|to do".to_string(),
        // relative days
        r"(?i)tomorrow|today".to_string(),
        format!(r"(?i)next\s+(?:{weekdays})"),
        format!(r"(?i)\b(?:{weekdays})\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    rules.push(Regex::clone(&IN_N_UNITS_RE));
    rules.extend(ABSOLUTE_DATE_RES.iter().cloned());
    rules.push(Regex::clone(&CLOCK_RE));
    rules.extend(
        [
            format!(r"(?i){day_parts}"),
            // connectives
            r"(?i)\b(?:by|at|on|due|before)\b".to_string(),
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap()),
    );
    rules
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Separator punctuation left dangling once a leading or trailing phrase is
/// gone ("Urgent: Fix the bug" → ": Fix the bug").
const EDGE_PUNCTUATION: &[char] = &[':', ';', ',', '-', ' '];

/// Strip every recognized command, keyword, date and time phrase from
/// `text`, leaving a capitalized title.
///
/// The rule pass repeats until nothing more is removed, so cleaning a
/// cleaned title is a no-op.
pub fn clean_title(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    capitalize_first(&current)
}

fn strip_once(text: &str) -> String {
    let stripped = REMOVALS
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    collapsed.trim_matches(EDGE_PUNCTUATION).to_string()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
