use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::WindowError;

pub const SLOT_MINUTES: u16 = 15;
pub const MINUTES_PER_DAY: u16 = 24 * 60;
pub const DEFAULT_MIN_SESSION_MINUTES: u16 = 30;

pub const DEFAULT_START: TimeOfDay = TimeOfDay(9 * 60);
pub const DEFAULT_END: TimeOfDay = TimeOfDay(10 * 60);

/// A time of day on the 15 minute grid, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Result<Self, WindowError> {
        if minutes >= MINUTES_PER_DAY || minutes % SLOT_MINUTES != 0 {
            return Err(WindowError::InvalidTime(format!(
                "{} minutes past midnight",
                minutes
            )));
        }
        Ok(Self(minutes))
    }

    pub fn hm(hour: u16, minute: u16) -> Result<Self, WindowError> {
        if hour >= 24 || minute >= 60 {
            return Err(WindowError::InvalidTime(format!("{}:{:02}", hour, minute)));
        }
        Self::from_minutes(hour * 60 + minute)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.0 / 60), u32::from(self.0 % 60), 0)
            .unwrap_or_default()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || WindowError::InvalidTime(trimmed.to_string());
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::hm(hour, minute).map_err(|_| invalid())
    }
}

/// Every selectable time of day, 00:00 through 23:45.
pub fn time_options() -> Vec<TimeOfDay> {
    (0..MINUTES_PER_DAY)
        .step_by(usize::from(SLOT_MINUTES))
        .map(TimeOfDay)
        .collect()
}

/// Checks the bounds of a proposed session. Time rules are checked before
/// the date so the same start/end pair always yields the same message.
pub fn validate_window(
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
    today: NaiveDate,
    min_session_minutes: u16,
) -> Result<(), WindowError> {
    if end <= start {
        return Err(WindowError::EndNotAfterStart);
    }
    if end.minutes() - start.minutes() < min_session_minutes {
        return Err(WindowError::TooShort {
            minimum: min_session_minutes,
        });
    }
    if date < today {
        return Err(WindowError::DateInPast);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(date: NaiveDate, start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { date, start, end }
    }

    pub fn duration_minutes(&self) -> i32 {
        i32::from(self.end.minutes()) - i32::from(self.start.minutes())
    }

    pub fn validate(&self, today: NaiveDate, min_session_minutes: u16) -> Result<(), WindowError> {
        validate_window(self.date, self.start, self.end, today, min_session_minutes)
    }

    /// Pins the window to absolute instants in `tz`. An ambiguous local time
    /// (clocks falling back) resolves to the earlier instant.
    pub fn resolve(&self, tz: Tz) -> Result<ResolvedWindow, WindowError> {
        let start = resolve_local(tz, self.date, self.start)?;
        let end = resolve_local(tz, self.date, self.end)?;
        Ok(ResolvedWindow { start, end })
    }

    /// Resolves and re-applies the duration rules to the real elapsed time,
    /// which is shorter than the wall-clock span across a spring-forward gap.
    pub fn resolve_for_session(
        &self,
        tz: Tz,
        min_session_minutes: u16,
    ) -> Result<ResolvedWindow, WindowError> {
        let resolved = self.resolve(tz)?;
        let minutes = resolved.duration_minutes();
        if minutes <= 0 {
            return Err(WindowError::EndNotAfterStart);
        }
        if minutes < i64::from(min_session_minutes) {
            return Err(WindowError::TooShort {
                minimum: min_session_minutes,
            });
        }
        Ok(resolved)
    }
}

fn resolve_local(tz: Tz, date: NaiveDate, time: TimeOfDay) -> Result<DateTime<Utc>, WindowError> {
    let local = date.and_time(time.to_naive_time());
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| WindowError::NonexistentLocalTime(local.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
