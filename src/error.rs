use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// A field value was rejected before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("priority must be between 1 and 5, got {0}")]
    PriorityOutOfRange(i64),

    #[error("duration must be a positive number of minutes, got {0}")]
    DurationNotPositive(i64),

    #[error("unknown category '{0}'; expected one of work, study, personal, home, finance, health, general")]
    UnknownCategory(String),

    #[error("unknown status '{0}'; expected active or done")]
    UnknownStatus(String),

    #[error("invalid date '{0}'; use YYYY-MM-DD")]
    BadDate(String),

    #[error("invalid time '{0}'; use HH:MM (24-hour)")]
    BadTime(String),

    #[error("a time slot is required")]
    MissingTime,

    #[error("cannot schedule tasks for past dates (like yesterday)")]
    RelativePast,

    #[error("cannot schedule tasks for past date ({date}); today is {today}")]
    PastDate { date: NaiveDate, today: NaiveDate },

    #[error("cannot schedule tasks for past time ({}); current time is {}", .time.format("%H:%M"), .now.format("%H:%M"))]
    PastTime { time: NaiveTime, now: NaiveTime },

    #[error("could not find a task name in '{0}'")]
    NoName(String),

    /// A command the parser refused, with the parser's reason.
    #[error("{0}")]
    Rejected(String),
}

/// Failure inside a persistent mirror backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("corrupt row {id}: {detail}")]
    CorruptRow { id: i64, detail: String },

    #[error("{0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// The in-memory registry and the persistent mirror disagree.
///
/// These are logged, never returned from a request whose mirror write
/// succeeded. [`crate::store::TaskStore::audit`] reports them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("id {id} was allocated but the mirror write failed: {reason}")]
    OrphanedId { id: u64, reason: String },

    #[error("task {0} is in the mirror but not in the registry")]
    MissingInRegistry(u64),

    #[error("task {0} is in the registry but not in the mirror")]
    MissingInMirror(u64),

    #[error("task {0} differs between registry and mirror")]
    FieldMismatch(u64),

    #[error("registry next id {next_id} does not exceed mirror max id {max_id}")]
    CounterBehind { next_id: u64, max_id: u64 },
}

/// Outcome of a core operation that did not succeed.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task {0} not found")]
    NotFound(u64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid scheduler config: {0}")]
    Scheduler(String),
}
