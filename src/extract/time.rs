use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Hour used when the sentence names a day but no time.
pub const DEFAULT_HOUR: u32 = 9;

/// `H[:MM] am|pm`, shared with the title cleaner.
pub(crate) static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());

/// Named day parts, in lookup order.
pub(crate) const DAY_PARTS: &[(&str, u32)] = &[
    ("evening", 18),
    ("morning", 9),
    ("afternoon", 14),
    ("night", 20),
];

/// Attach a time of day to `day`: an explicit clock reading first, then a
/// named day part, otherwise 09:00.
pub fn apply_time(lower: &str, day: NaiveDate) -> NaiveDateTime {
    let time = clock_time(lower)
        .or_else(|| day_part(lower))
        .or_else(|| NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0))
        .unwrap_or_default();
    day.and_time(time)
}

/// First `H[:MM] am|pm` in the text, converted to 24-hour time. Readings that
/// are not a valid time of day ("25pm", "7:75am") are ignored.
fn clock_time(lower: &str) -> Option<NaiveTime> {
    let caps = CLOCK_RE.captures(lower)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match &caps[3] {
        "pm" if hour < 12 => hour += 12,
        "am" if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn day_part(lower: &str) -> Option<NaiveTime> {
    DAY_PARTS
        .iter()
        .find(|(word, _)| lower.contains(word))
        .and_then(|(_, hour)| NaiveTime::from_hms_opt(*hour, 0, 0))
}
