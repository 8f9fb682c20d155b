use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date format used for deadlines everywhere (storage, CLI, parser output).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time format used for start times; always zero-padded 24-hour.
pub const TIME_FORMAT: &str = "%H:%M";

/// The fixed set of task categories, in declaration order.
///
/// The order matters: the command parser scans categories in this order and
/// the first whole-word match wins.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Study,
    Personal,
    Home,
    Finance,
    Health,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::Study,
        Category::Personal,
        Category::Home,
        Category::Finance,
        Category::Health,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Study => "study",
            Category::Personal => "personal",
            Category::Home => "home",
            Category::Finance => "finance",
            Category::Health => "health",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or(s)
    }
}

/// Task lifecycle status. Ordering puts `Active` before `Done`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Done,
}

impl Status {
    /// Integer code used by the SQLite mirror (`0` active, `1` done).
    pub fn code(&self) -> i64 {
        match self {
            Status::Active => 0,
            Status::Done => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Status> {
        match code {
            0 => Some(Status::Active),
            1 => Some(Status::Done),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => f.write_str("active"),
            Status::Done => f.write_str("done"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "0" => Ok(Status::Active),
            "done" | "1" => Ok(Status::Done),
            other => Err(other.to_string()),
        }
    }
}

/// Represents a single task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, issued once by the registry and never reused.
    pub id: u64,
    /// Non-empty, trimmed task name.
    pub name: String,
    /// Category from the fixed set.
    #[serde(default)]
    pub category: Category,
    /// 1 (most urgent) to 5.
    pub priority: u8,
    /// Due date. `None` means explicitly unset.
    #[serde(default, with = "blank_date")]
    pub deadline: Option<NaiveDate>,
    /// Start time. `None` means unscheduled (a ghost task when active).
    #[serde(default, with = "blank_time")]
    pub start_time: Option<NaiveTime>,
    /// Duration in minutes, always positive.
    pub duration: u32,
    /// Whether the task is still open.
    #[serde(default)]
    pub status: Status,
}

impl Task {
    /// Key used for listing: status, priority, deadline, start time, then id.
    ///
    /// `None` sorts before any date/time, matching the lexical order of the
    /// empty string in the row store.
    pub fn list_key(&self) -> (Status, u8, Option<NaiveDate>, Option<NaiveTime>, u64) {
        (self.status, self.priority, self.deadline, self.start_time, self.id)
    }

    /// An active task with no start time.
    pub fn is_ghost(&self) -> bool {
        self.status == Status::Active && self.start_time.is_none()
    }

    pub fn deadline_str(&self) -> String {
        format_date(self.deadline)
    }

    pub fn start_time_str(&self) -> String {
        format_time(self.start_time)
    }
}

/// Fully validated values for a task that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub category: Category,
    pub priority: u8,
    pub deadline: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub duration: u32,
    pub status: Status,
}

impl TaskDraft {
    pub fn into_task(self, id: u64) -> Task {
        Task {
            id,
            name: self.name,
            category: self.category,
            priority: self.priority,
            deadline: self.deadline,
            start_time: self.start_time,
            duration: self.duration,
            status: self.status,
        }
    }
}

/// Raw creation fields as supplied by a caller (CLI flags, assistant, ...).
///
/// Everything except `name` is optional and falls back to the defaults:
/// `general`, priority 3, deadline today, unscheduled, 30 minutes, active.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TaskInput {
    pub name: String,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub deadline: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<i64>,
    pub status: Option<String>,
}

/// Raw partial update. `None` leaves a field unchanged.
///
/// For `deadline` and `start_time`, `Some("")` is a real value: it clears
/// the field.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub deadline: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<i64>,
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.start_time.is_none()
            && self.duration.is_none()
            && self.status.is_none()
    }
}

/// Validated partial update, applied field by field to both store tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<u8>,
    pub deadline: Option<Option<NaiveDate>>,
    pub start_time: Option<Option<NaiveTime>>,
    pub duration: Option<u32>,
    pub status: Option<Status>,
}

impl Changes {
    /// Whether the update touches the schedule and must pass the past gate.
    pub fn touches_schedule(&self) -> bool {
        self.deadline.is_some() || self.start_time.is_some()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(n) = &self.name {
            task.name = n.clone();
        }
        if let Some(c) = self.category {
            task.category = c;
        }
        if let Some(p) = self.priority {
            task.priority = p;
        }
        if let Some(d) = self.deadline {
            task.deadline = d;
        }
        if let Some(t) = self.start_time {
            task.start_time = t;
        }
        if let Some(d) = self.duration {
            task.duration = d;
        }
        if let Some(s) = self.status {
            task.status = s;
        }
    }
}

/// Output of the command parser. Never stored.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub name: String,
    pub category: Category,
    pub priority: u8,
    /// `None` when the text referred to a day in the past ("yesterday").
    #[serde(with = "blank_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(with = "blank_time")]
    pub start_time: Option<NaiveTime>,
    pub duration: u32,
    pub status: Status,
    pub valid: bool,
    pub error: Option<String>,
}

/// A proposed slot for a ghost task. Never stored.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SlotSuggestion {
    pub task_id: u64,
    pub name: String,
    pub priority: u8,
    /// Duration used for slot finding (after the minimum clamp).
    pub duration: u32,
    #[serde(with = "blank_time::required")]
    pub suggested_time: NaiveTime,
    /// The date the suggestion was computed for.
    #[serde(with = "blank_date::required")]
    pub deadline: NaiveDate,
    /// Set when no free slot existed and the window start was used anyway.
    pub fallback: bool,
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

pub fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string()).unwrap_or_default()
}

/// Serde adapter: `Option<NaiveDate>` as `"YYYY-MM-DD"` or `""`.
pub mod blank_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }

    pub mod required {
        use chrono::NaiveDate;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
            super::serialize(&Some(*value), s)
        }
    }
}

/// Serde adapter: `Option<NaiveTime>` as `"HH:MM"` or `""`.
pub mod blank_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveTime::parse_from_str(raw, TIME_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }

    pub mod required {
        use chrono::NaiveTime;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
            super::serialize(&Some(*value), s)
        }
    }
}
