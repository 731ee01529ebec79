use crate::task::{Priority, Status};

/// Priority keyword rules. Order matters: the first rule with a hit wins.
const PRIORITY_RULES: &[(&[&str], Priority)] = &[
    (&["urgent", "critical"], Priority::Urgent),
    (&["high priority", "high"], Priority::High),
    (&["low priority", "low"], Priority::Low),
];

const STATUS_RULES: &[(&[&str], Status)] = &[
    (&["in progress"], Status::InProgress),
    (&["done", "completed"], Status::Done),
];

/// Classify priority by substring search on lower-cased text.
pub fn extract_priority(lower: &str) -> Priority {
    first_match(lower, PRIORITY_RULES).unwrap_or_default()
}

/// Classify status by substring search on lower-cased text.
pub fn extract_status(lower: &str) -> Status {
    first_match(lower, STATUS_RULES).unwrap_or_default()
}

fn first_match<T: Copy>(lower: &str, rules: &[(&[&str], T)]) -> Option<T> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, value)| *value)
}
