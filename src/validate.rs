//! Field validation shared by the parser path and direct edits.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::clock::minute_of;
use crate::error::ValidationError;
use crate::models::{Category, Changes, Status, TaskDraft, TaskInput, TaskPatch, DATE_FORMAT};

pub const DEFAULT_PRIORITY: u8 = 3;
pub const DEFAULT_DURATION: u32 = 30;

/// Rejects a deadline before today, or a start time earlier than the current
/// minute on a task due today.
pub fn check_not_past(
    deadline: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    now: NaiveDateTime,
) -> Result<(), ValidationError> {
    let today = now.date();
    let Some(date) = deadline else {
        return Ok(());
    };
    if date < today {
        return Err(ValidationError::PastDate { date, today });
    }
    if date == today {
        if let Some(time) = start_time {
            let current = minute_of(now);
            if time < current {
                return Err(ValidationError::PastTime { time, now: current });
            }
        }
    }
    Ok(())
}

pub fn parse_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Empty input means `general`.
pub fn parse_category(raw: &str) -> Result<Category, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(Category::General);
    }
    raw.parse().map_err(ValidationError::UnknownCategory)
}

pub fn parse_priority(raw: i64) -> Result<u8, ValidationError> {
    match u8::try_from(raw) {
        Ok(p) if (1..=5).contains(&p) => Ok(p),
        _ => Err(ValidationError::PriorityOutOfRange(raw)),
    }
}

pub fn parse_duration(raw: i64) -> Result<u32, ValidationError> {
    match u32::try_from(raw) {
        Ok(d) if d > 0 => Ok(d),
        _ => Err(ValidationError::DurationNotPositive(raw)),
    }
}

pub fn parse_status(raw: &str) -> Result<Status, ValidationError> {
    raw.parse().map_err(ValidationError::UnknownStatus)
}

/// `""` is a valid value meaning "unset".
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::BadDate(raw.to_string()))
}

/// Accepts `H:MM` or `HH:MM`; `""` means unscheduled.
pub fn parse_time(raw: &str) -> Result<Option<NaiveTime>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let bad = || ValidationError::BadTime(raw.to_string());
    let (h, m) = raw.split_once(':').ok_or_else(bad)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(bad());
    }
    let h: u32 = h.parse().map_err(|_| bad())?;
    let m: u32 = m.parse().map_err(|_| bad())?;
    NaiveTime::from_hms_opt(h, m, 0).map(Some).ok_or_else(bad)
}

/// Turns raw creation fields into a draft. An empty deadline becomes today.
pub fn draft_from_input(input: &TaskInput, now: NaiveDateTime) -> Result<TaskDraft, ValidationError> {
    let name = parse_name(&input.name)?;
    let category = match &input.category {
        Some(c) => parse_category(c)?,
        None => Category::General,
    };
    let priority = match input.priority {
        Some(p) => parse_priority(p)?,
        None => DEFAULT_PRIORITY,
    };
    let deadline = match &input.deadline {
        Some(d) => parse_date(d)?,
        None => None,
    }
    .or(Some(now.date()));
    let start_time = match &input.start_time {
        Some(t) => parse_time(t)?,
        None => None,
    };
    let duration = match input.duration {
        Some(d) => parse_duration(d)?,
        None => DEFAULT_DURATION,
    };
    let status = match &input.status {
        Some(s) => parse_status(s)?,
        None => Status::Active,
    };

    check_not_past(deadline, start_time, now)?;

    Ok(TaskDraft {
        name,
        category,
        priority,
        deadline,
        start_time,
        duration,
        status,
    })
}

/// Validates each field present in the patch. The past gate is applied
/// later, against the merged row.
pub fn changes_from_patch(patch: &TaskPatch) -> Result<Changes, ValidationError> {
    Ok(Changes {
        name: patch.name.as_deref().map(parse_name).transpose()?,
        category: patch.category.as_deref().map(parse_category).transpose()?,
        priority: patch.priority.map(parse_priority).transpose()?,
        deadline: patch.deadline.as_deref().map(parse_date).transpose()?,
        start_time: patch.start_time.as_deref().map(parse_time).transpose()?,
        duration: patch.duration.map(parse_duration).transpose()?,
        status: patch.status.as_deref().map(parse_status).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};

    fn now() -> NaiveDateTime {
        FixedClock::at("2026-03-10", "10:30").now()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_past_date_rejected() {
        let err = check_not_past(Some(date("2026-03-09")), None, now()).unwrap_err();
        assert!(err.to_string().contains("2026-03-09"));
    }

    #[test]
    fn test_past_time_today_rejected() {
        let t = NaiveTime::from_hms_opt(9, 0, 0);
        let err = check_not_past(Some(date("2026-03-10")), t, now()).unwrap_err();
        assert!(err.to_string().contains("09:00"));
    }

    #[test]
    fn test_current_minute_allowed() {
        let t = NaiveTime::from_hms_opt(10, 30, 0);
        assert!(check_not_past(Some(date("2026-03-10")), t, now()).is_ok());
    }

    #[test]
    fn test_past_time_on_future_day_allowed() {
        let t = NaiveTime::from_hms_opt(6, 0, 0);
        assert!(check_not_past(Some(date("2026-03-11")), t, now()).is_ok());
    }

    #[test]
    fn test_parse_time_pads() {
        assert_eq!(parse_time("9:05").unwrap(), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("").unwrap(), None);
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("9:5").is_err());
        assert!(parse_time("noon").is_err());
    }

    #[test]
    fn test_draft_defaults() {
        let input = TaskInput { name: "  write report ".into(), ..Default::default() };
        let draft = draft_from_input(&input, now()).unwrap();
        assert_eq!(draft.name, "write report");
        assert_eq!(draft.category, Category::General);
        assert_eq!(draft.priority, 3);
        assert_eq!(draft.duration, 30);
        assert_eq!(draft.deadline, Some(date("2026-03-10")));
        assert_eq!(draft.start_time, None);
        assert_eq!(draft.status, Status::Active);
    }

    #[test]
    fn test_draft_rejects_out_of_range() {
        let input = TaskInput { name: "x".into(), priority: Some(6), ..Default::default() };
        assert_eq!(draft_from_input(&input, now()), Err(ValidationError::PriorityOutOfRange(6)));

        let input = TaskInput { name: "x".into(), duration: Some(0), ..Default::default() };
        assert_eq!(draft_from_input(&input, now()), Err(ValidationError::DurationNotPositive(0)));

        let input = TaskInput { name: "x".into(), category: Some("hobby".into()), ..Default::default() };
        assert!(matches!(draft_from_input(&input, now()), Err(ValidationError::UnknownCategory(_))));
    }

    #[test]
    fn test_patch_blank_schedule_means_clear() {
        let patch = TaskPatch {
            start_time: Some(String::new()),
            deadline: Some(String::new()),
            ..Default::default()
        };
        let changes = changes_from_patch(&patch).unwrap();
        assert_eq!(changes.start_time, Some(None));
        assert_eq!(changes.deadline, Some(None));
        assert_eq!(changes.priority, None);
    }
}
