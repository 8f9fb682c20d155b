use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ConsistencyError, StoreError, TaskError, ValidationError};
use crate::models::{ParseResult, SlotSuggestion, Task, TaskDraft, TaskInput, TaskPatch};
use crate::parser;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::storage::{self, Mirror, SqliteMirror};
use crate::store::TaskStore;
use crate::validate::{self, check_not_past};

/// The operations offered to front-ends: create, list, patch, delete,
/// parse, ghost scheduling and solidify.
///
/// The clock is sampled once at the start of each call.
pub struct Planner {
    store: TaskStore,
    scheduler: Scheduler,
    clock: Box<dyn Clock>,
}

impl Planner {
    pub fn new(mirror: Box<dyn Mirror>, scheduler: SchedulerConfig, clock: Box<dyn Clock>) -> Result<Planner, StoreError> {
        Ok(Planner {
            store: TaskStore::open(mirror)?,
            scheduler: Scheduler::new(scheduler),
            clock,
        })
    }

    /// Opens the configured database with the system clock.
    pub fn open(config: &Config) -> Result<Planner, StoreError> {
        let mirror = storage::open(config.backend(), &config.database_path())?;
        Planner::new(mirror, config.scheduler, Box::new(SystemClock))
    }

    /// A planner over an empty in-memory SQLite mirror.
    pub fn in_memory(clock: impl Clock + 'static) -> Result<Planner, StoreError> {
        Planner::new(
            Box::new(SqliteMirror::in_memory()?),
            SchedulerConfig::default(),
            Box::new(clock),
        )
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Validates `input` and stores it. Returns the new id.
    pub fn create_task(&self, input: &TaskInput) -> Result<u64, TaskError> {
        let draft = validate::draft_from_input(input, self.clock.now())?;
        Ok(self.store.create(draft)?.id)
    }

    /// Parses `text` and stores the result. Returns the new id.
    pub fn create_from_text(&self, text: &str) -> Result<u64, TaskError> {
        let now = self.clock.now();
        let parsed = parser::parse(text, now);
        if !parsed.valid {
            let reason = parsed
                .error
                .unwrap_or_else(|| "could not parse that command".to_string());
            return Err(ValidationError::Rejected(reason).into());
        }
        let deadline = parsed.deadline.or(Some(now.date()));
        check_not_past(deadline, parsed.start_time, now)?;

        let draft = TaskDraft {
            name: parsed.name,
            category: parsed.category,
            priority: parsed.priority,
            deadline,
            start_time: parsed.start_time,
            duration: parsed.duration,
            status: parsed.status,
        };
        Ok(self.store.create(draft)?.id)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list()?)
    }

    pub fn get_task(&self, id: u64) -> Result<Task, TaskError> {
        self.store.get(id)
    }

    /// Applies the fields present in `patch`. Returns the updated task.
    pub fn patch_task(&self, id: u64, patch: &TaskPatch) -> Result<Task, TaskError> {
        let changes = validate::changes_from_patch(patch)?;
        self.store.update(id, &changes, self.clock.now())
    }

    pub fn delete_task(&self, id: u64) -> Result<(), TaskError> {
        self.store.delete(id)
    }

    pub fn parse_command(&self, text: &str) -> ParseResult {
        parser::parse(text, self.clock.now())
    }

    /// Slot suggestions for `date` (today if `None`). Writes nothing.
    pub fn ghost_schedule(&self, date: Option<NaiveDate>) -> Result<Vec<SlotSuggestion>, TaskError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let tasks = self.store.list()?;
        let suggestions = self.scheduler.suggest(&tasks, date);
        debug!(%date, count = suggestions.len(), "ghost schedule computed");
        Ok(suggestions)
    }

    /// Commits a suggested start time (and optionally a new date) to a task.
    pub fn solidify(&self, id: u64, time: &str, date: Option<&str>) -> Result<Task, TaskError> {
        if time.trim().is_empty() {
            return Err(ValidationError::MissingTime.into());
        }
        let patch = TaskPatch {
            start_time: Some(time.to_string()),
            deadline: date.filter(|d| !d.trim().is_empty()).map(str::to_string),
            ..Default::default()
        };
        self.patch_task(id, &patch)
    }

    pub fn audit(&self) -> Result<Vec<ConsistencyError>, TaskError> {
        Ok(self.store.audit()?)
    }
}
