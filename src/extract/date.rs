use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Utterance;

const MONTHS_FULL: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";
const MONTHS_ABBR: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

/// Month name or abbreviation to month number (1-based, as chrono expects).
const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

pub(crate) const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

static IN_DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"in (\d+) days?").unwrap());
static IN_WEEKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"in (\d+) weeks?").unwrap());

/// "in N days" / "in N weeks", shared with the title cleaner.
pub(crate) static IN_N_UNITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)in \d+ (?:days?|weeks?)").unwrap());

/// Per weekday: "next <day>" and "(by|due|before) <day>".
static WEEKDAY_RES: Lazy<Vec<(Weekday, Regex, Regex)>> = Lazy::new(|| {
    WEEKDAYS
        .iter()
        .map(|(name, day)| {
            (
                *day,
                Regex::new(&format!(r"next\s+{name}")).unwrap(),
                Regex::new(&format!(r"\b(?:by|due|before)\s+{name}\b")).unwrap(),
            )
        })
        .collect()
});

/// The four absolute surface forms, in matching order. Each has a `day` and
/// a `month` group.
pub(crate) static ABSOLUTE_DATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?P<month>{MONTHS_FULL})\b"),
        format!(r"(?i)\b(?P<month>{MONTHS_FULL})\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\b"),
        format!(r"(?i)\b(?P<month>{MONTHS_ABBR})\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\b"),
        format!(r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?P<month>{MONTHS_ABBR})\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

type DateStrategy = fn(&Utterance<'_>, NaiveDateTime) -> Option<NaiveDate>;

/// Tried in order; the first strategy that yields a date wins.
const STRATEGIES: &[(&str, DateStrategy)] = &[
    ("relative_numeric", relative_numeric),
    ("simple_relative", simple_relative),
    ("weekday", weekday),
    ("absolute", absolute),
];

/// Resolve the calendar day a sentence refers to, if any.
pub fn resolve_date(input: &Utterance<'_>, now: NaiveDateTime) -> Option<NaiveDate> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let day = strategy(input, now)?;
        tracing::debug!(strategy = name, %day, "Resolved due date");
        Some(day)
    })
}

fn relative_numeric(input: &Utterance<'_>, now: NaiveDateTime) -> Option<NaiveDate> {
    let today = now.date();

    let by_days = IN_DAYS_RE
        .captures(&input.lower)
        .and_then(|caps| add_units(today, &caps[1], 1));
    if by_days.is_some() {
        return by_days;
    }

    let caps = IN_WEEKS_RE.captures(&input.lower)?;
    add_units(today, &caps[1], 7)
}

/// `today + count * unit_days`, or `None` if the count does not fit.
fn add_units(today: NaiveDate, count: &str, unit_days: u64) -> Option<NaiveDate> {
    let n: u64 = count.parse().ok()?;
    today.checked_add_days(Days::new(n.checked_mul(unit_days)?))
}

fn simple_relative(input: &Utterance<'_>, now: NaiveDateTime) -> Option<NaiveDate> {
    let today = now.date();
    if input.lower.contains("tomorrow") {
        today.succ_opt()
    } else if input.lower.contains("today") {
        Some(today)
    } else {
        None
    }
}

fn weekday(input: &Utterance<'_>, now: NaiveDateTime) -> Option<NaiveDate> {
    // Monday first. With several weekday names in one sentence the earliest
    // in this order wins, not the earliest in the text.
    let (target, _, _) = WEEKDAY_RES
        .iter()
        .find(|(_, next, deadline)| next.is_match(&input.lower) || deadline.is_match(&input.lower))?;
    next_weekday(now.date(), *target)
}

/// The next `target` strictly after `today` (a week ahead if today is `target`).
fn next_weekday(today: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let ahead = match (wanted + 7 - current) % 7 {
        0 => 7,
        n => n,
    };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

fn absolute(input: &Utterance<'_>, now: NaiveDateTime) -> Option<NaiveDate> {
    let caps = ABSOLUTE_DATE_RES
        .iter()
        .find_map(|re| re.captures(input.original))?;

    let day: u32 = caps["day"].parse().ok()?;
    let month = month_number(&caps["month"])?;
    roll_forward(now, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(m, _)| *m == name)
        .map(|(_, n)| *n)
}

/// Place `month`/`day` in the reference year, or the next one if that day
/// has already begun passing (midnight before `now`) or does not exist.
/// Days that exist in neither year (31 Feb) resolve to nothing.
fn roll_forward(now: NaiveDateTime, month: u32, day: u32) -> Option<NaiveDate> {
    let year = now.year();
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) if date.and_hms_opt(0, 0, 0).is_some_and(|midnight| midnight >= now) => {
            Some(date)
        }
        _ => NaiveDate::from_ymd_opt(year + 1, month, day),
    }
}
