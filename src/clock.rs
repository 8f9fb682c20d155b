use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Source of the current local date and time.
///
/// Sampled once per operation; nothing re-reads the clock mid-call.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Builds a clock from `YYYY-MM-DD` and `HH:MM`. Panics on bad input.
    pub fn at(date: &str, time: &str) -> FixedClock {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date");
        let time = NaiveTime::parse_from_str(time, "%H:%M").expect("valid time");
        FixedClock(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Current time truncated to the minute, the resolution of stored start times.
pub fn minute_of(now: NaiveDateTime) -> NaiveTime {
    NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN)
}
