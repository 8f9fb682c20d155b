//! Greedy slot suggestions for ghost tasks on a 30-minute grid.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::{SlotSuggestion, Status, Task};

/// Working window and grid for suggestions. Times are minutes after midnight.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    #[serde(with = "clock_minutes")]
    pub day_start: u32,
    #[serde(with = "clock_minutes")]
    pub day_end: u32,
    pub step_minutes: u32,
    pub max_candidates: usize,
    /// Floor applied to a task's duration while searching for a slot.
    pub min_duration: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            day_start: 8 * 60,
            day_end: 20 * 60,
            step_minutes: 30,
            max_candidates: 6,
            min_duration: 15,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_end <= self.day_start {
            return Err(ConfigError::Scheduler("day_end must be after day_start".into()));
        }
        if self.day_end > 24 * 60 {
            return Err(ConfigError::Scheduler("day_end must be at most 24:00".into()));
        }
        if self.step_minutes == 0 {
            return Err(ConfigError::Scheduler("step_minutes must be positive".into()));
        }
        Ok(())
    }
}

/// Half-open interval of minutes after midnight. Wide enough that no task
/// duration can overflow its end.
type Span = (u64, u64);

fn overlaps(a: Span, b: Span) -> bool {
    !(a.1 <= b.0 || a.0 >= b.1)
}

fn minutes_of(t: NaiveTime) -> u64 {
    u64::from(t.hour() * 60 + t.minute())
}

fn time_of(minutes: u64) -> NaiveTime {
    let (h, m) = ((minutes / 60) % 24, minutes % 60);
    NaiveTime::from_hms_opt(h as u32, m as u32, 0).unwrap_or(NaiveTime::MIN)
}

pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Scheduler {
        Scheduler { config }
    }

    /// Proposes a start time on `date` for each of the most urgent ghost
    /// tasks in `tasks`.
    ///
    /// Candidates are active, unscheduled tasks ranked by priority then
    /// deadline. Each takes the first grid point whose span is free of the
    /// day's scheduled tasks and of earlier suggestions; if none is free it
    /// falls back to the window start and is marked `fallback`. Every placed
    /// span, fallback included, blocks later candidates.
    pub fn suggest(&self, tasks: &[Task], date: NaiveDate) -> Vec<SlotSuggestion> {
        let cfg = &self.config;

        let mut candidates: Vec<&Task> = tasks.iter().filter(|t| t.is_ghost()).collect();
        candidates.sort_by_key(|t| (t.priority, t.deadline, t.id));
        candidates.truncate(cfg.max_candidates);

        let mut occupied: Vec<Span> = tasks
            .iter()
            .filter(|t| t.status == Status::Active && t.deadline == Some(date))
            .filter_map(|t| {
                let start = minutes_of(t.start_time?);
                Some((start, start + u64::from(t.duration)))
            })
            .collect();

        let (day_start, day_end) = (u64::from(cfg.day_start), u64::from(cfg.day_end));
        let mut out = Vec::with_capacity(candidates.len());
        for task in candidates {
            let duration = task.duration.max(cfg.min_duration);
            let length = u64::from(duration);

            let mut slot = None;
            let mut cur = day_start;
            while cur + length <= day_end {
                let span = (cur, cur + length);
                if !occupied.iter().any(|o| overlaps(span, *o)) {
                    slot = Some(cur);
                    break;
                }
                cur += u64::from(cfg.step_minutes);
            }

            let fallback = slot.is_none();
            let start = slot.unwrap_or(day_start);
            occupied.push((start, start + length));
            debug!(task_id = task.id, start, duration, fallback, "slot placed");

            out.push(SlotSuggestion {
                task_id: task.id,
                name: task.name.clone(),
                priority: task.priority,
                duration,
                suggested_time: time_of(start),
                deadline: date,
                fallback,
            });
        }
        out
    }
}

/// Serde adapter reading `"HH:MM"` into minutes after midnight.
mod clock_minutes {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(d)?;
        let (h, m) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got {raw}")))?;
        let h: u32 = h.parse().map_err(serde::de::Error::custom)?;
        let m: u32 = m.parse().map_err(serde::de::Error::custom)?;
        if m > 59 || h * 60 + m > 24 * 60 {
            return Err(serde::de::Error::custom(format!("time out of range: {raw}")));
        }
        Ok(h * 60 + m)
    }
}
