//! Free-form task text to structured fields.
//!
//! Each field has its own extractor, a pure function of the text (and the
//! current date where relevant). [`parse`] runs them in a fixed order:
//! priority, duration, date, time, then the past-date gate, then category
//! and name. Within one extractor the first matching rule wins.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{Category, ParseResult, Status};
use crate::validate::{check_not_past, DEFAULT_DURATION, DEFAULT_PRIORITY};

/// Weekday spellings in tie-break order. When several appear in one text the
/// first entry here that matches anywhere wins.
const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("tues", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("thur", Weekday::Thu),
    ("thurs", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sat", Weekday::Sat),
    ("sunday", Weekday::Sun),
    ("sun", Weekday::Sun),
];

const TOMORROW_SPELLINGS: &[&str] = &["tomorrow", "tmr", "tmrw", "tommow"];

static RE_PRIORITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bp([1-5])\b").unwrap());

static RE_DURATION_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*h(?:\s*(\d+)\s*m)?\b").unwrap());

static RE_DURATION_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*m\b").unwrap());

static RE_IN_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bin\s+(-?\d+)\s+days?\b").unwrap());

static RE_NEXT_WEEK_DAY: LazyLock<Vec<(Weekday, Regex)>> = LazyLock::new(|| {
    WEEKDAYS
        .iter()
        .map(|(name, day)| {
            let re = Regex::new(&format!(r"(?i)\bnext\s+week\s+{name}\b")).unwrap();
            (*day, re)
        })
        .collect()
});

static RE_DAY: LazyLock<Vec<(Weekday, Regex)>> = LazyLock::new(|| {
    WEEKDAYS
        .iter()
        .map(|(name, day)| {
            let re = Regex::new(&format!(r"(?i)\b(?:next\s+)?{name}\b")).unwrap();
            (*day, re)
        })
        .collect()
});

static RE_TIME_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static RE_TIME_12H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());

static RE_CATEGORY: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    Category::ALL
        .iter()
        .map(|c| (*c, Regex::new(&format!(r"(?i)\b{}\b", c.as_str())).unwrap()))
        .collect()
});

/// Everything the name extractor removes, applied in this order.
static RE_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let days = WEEKDAYS.iter().map(|(n, _)| *n).collect::<Vec<_>>().join("|");
    let cats = Category::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join("|");
    [
        r"\bp[1-5]\b".to_string(),
        r"\b\d+\s*h(?:\s*\d+\s*m)?\b".to_string(),
        r"\b\d+\s*m\b".to_string(),
        r"\b(?:today|tomorrow|tmr|tmrw|tommow|yesterday)\b".to_string(),
        r"\bin\s+-?\d+\s+days?\b".to_string(),
        format!(r"\bnext\s+week\s+(?:{days})\b"),
        format!(r"\bnext\s+(?:{days})\b"),
        format!(r"\b(?:{days})\b"),
        r"\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b".to_string(),
        r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b".to_string(),
        r"\bfor\b".to_string(),
        r"\bat\b".to_string(),
        format!(r"\b(?:{cats})\b"),
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Result of date extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMatch {
    /// The text refers to a day before today ("yesterday", "in -2 days").
    Past,
    On(NaiveDate),
}

/// `p1`..`p5` as a whole word.
pub fn extract_priority(text: &str) -> Option<u8> {
    RE_PRIORITY
        .captures(text)
        .and_then(|c| c[1].parse().ok())
}

/// Minutes from `2h`, `2h30m`, `1h 15m`, or else a bare `90m`.
///
/// Returns `None` when nothing matches or the value is not positive.
pub fn extract_duration(text: &str) -> Option<u32> {
    let minutes: u32 = if let Some(c) = RE_DURATION_HOURS.captures(text) {
        let hours: u32 = c[1].parse().ok()?;
        let extra: u32 = match c.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        hours.checked_mul(60)?.checked_add(extra)?
    } else {
        let c = RE_DURATION_MINUTES.captures(text)?;
        c[1].parse().ok()?
    };
    (minutes > 0).then_some(minutes)
}

/// Resolves the deadline, first matching rule wins:
/// yesterday, today, tomorrow, "in N days", "next week <day>",
/// "next <day>" or a bare day, else today.
pub fn extract_date(text: &str, today: NaiveDate) -> DateMatch {
    let t = text.to_lowercase();

    if t.contains("yesterday") {
        return DateMatch::Past;
    }
    if t.contains("today") {
        return DateMatch::On(today);
    }
    if TOMORROW_SPELLINGS.iter().any(|s| t.contains(s)) {
        if let Some(d) = today.checked_add_days(Days::new(1)) {
            return DateMatch::On(d);
        }
    }
    if let Some(c) = RE_IN_DAYS.captures(&t) {
        if let Ok(n) = c[1].parse::<i64>() {
            if n < 0 {
                return DateMatch::Past;
            }
            if let Some(d) = today.checked_add_days(Days::new(n as u64)) {
                return DateMatch::On(d);
            }
        }
    }
    for (day, re) in RE_NEXT_WEEK_DAY.iter() {
        if re.is_match(&t) {
            return DateMatch::On(next_weekday(today, *day) + Days::new(7));
        }
    }
    for (day, re) in RE_DAY.iter() {
        if re.is_match(&t) {
            return DateMatch::On(next_weekday(today, *day));
        }
    }
    DateMatch::On(today)
}

/// Next occurrence of `day` strictly after `today` (1..=7 days ahead).
pub fn next_weekday(today: NaiveDate, day: Weekday) -> NaiveDate {
    let cur = today.weekday().num_days_from_monday() as i64;
    let target = day.num_days_from_monday() as i64;
    let mut ahead = (target - cur).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    today + Days::new(ahead as u64)
}

/// `HH:MM` (24-hour) first, else `H[:MM]am|pm`.
///
/// A 24-hour match wins even when an am/pm suffix follows it, so
/// `2:30 pm` reads as 02:30.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    if let Some(c) = RE_TIME_24H.captures(text) {
        let h: u32 = c[1].parse().ok()?;
        let m: u32 = c[2].parse().ok()?;
        return NaiveTime::from_hms_opt(h, m, 0);
    }

    let c = RE_TIME_12H.captures(text)?;
    let mut h: u32 = c[1].parse().ok()?;
    let m: u32 = match c.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let pm = c[3].eq_ignore_ascii_case("pm");
    if pm && h != 12 {
        h += 12;
    }
    if !pm && h == 12 {
        h = 0;
    }
    if h > 23 || m > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(h, m, 0)
}

/// First category, in declaration order, that appears as a whole word.
pub fn extract_category(text: &str) -> Option<Category> {
    RE_CATEGORY
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(c, _)| *c)
}

/// The text with every recognised token and the fillers "for"/"at" removed,
/// whitespace collapsed. Case of the remaining words is preserved.
pub fn extract_name(text: &str) -> String {
    let mut rest = text.to_string();
    for re in RE_STRIP.iter() {
        rest = re.replace_all(&rest, " ").into_owned();
    }
    collapse_whitespace(&rest)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses `text` as of `now`.
///
/// A past date or time stops parsing before category and name are
/// computed; the result is then invalid with a reason in `error`.
pub fn parse(text: &str, now: NaiveDateTime) -> ParseResult {
    let raw = text.trim();
    let today = now.date();

    let priority = extract_priority(raw).unwrap_or(DEFAULT_PRIORITY);
    let duration = extract_duration(raw).unwrap_or(DEFAULT_DURATION);
    let date = extract_date(raw, today);
    let start_time = extract_time(raw);

    let mut out = ParseResult {
        name: String::new(),
        category: Category::General,
        priority,
        deadline: match date {
            DateMatch::Past => None,
            DateMatch::On(d) => Some(d),
        },
        start_time,
        duration,
        status: Status::Active,
        valid: false,
        error: None,
    };

    let gate = match date {
        DateMatch::Past => Err(ValidationError::RelativePast),
        DateMatch::On(d) => check_not_past(Some(d), start_time, now),
    };
    if let Err(e) = gate {
        debug!(text = raw, error = %e, "command rejected");
        out.error = Some(e.to_string());
        return out;
    }

    out.category = extract_category(raw).unwrap_or_default();

    // A text made only of recognised tokens keeps itself as the name.
    let mut name = extract_name(raw);
    if name.is_empty() {
        name = collapse_whitespace(raw);
    }
    out.valid = !name.is_empty();
    if !out.valid {
        out.error = Some(ValidationError::NoName(raw.to_string()).to_string());
    }
    out.name = name;

    debug!(
        text = raw,
        name = %out.name,
        priority = out.priority,
        duration = out.duration,
        deadline = ?out.deadline,
        start_time = ?out.start_time,
        "command parsed"
    );
    out
}
