use chrono::NaiveDate;

use crate::error::WindowError;
use crate::models::time_window::{DEFAULT_END, DEFAULT_START, TimeOfDay, TimeWindow};

/// Date plus start/end selection with its validity recomputed on every edit.
#[derive(Debug, Clone)]
pub struct TimeSlotSelector {
    window: TimeWindow,
    today: NaiveDate,
    min_session_minutes: u16,
    error: Option<WindowError>,
}

impl TimeSlotSelector {
    pub fn new(window: TimeWindow, today: NaiveDate, min_session_minutes: u16) -> Self {
        let mut selector = Self {
            window,
            today,
            min_session_minutes,
            error: None,
        };
        selector.recompute();
        selector
    }

    /// Today, 09:00 to 10:00.
    pub fn with_defaults(today: NaiveDate, min_session_minutes: u16) -> Self {
        Self::new(
            TimeWindow::new(today, DEFAULT_START, DEFAULT_END),
            today,
            min_session_minutes,
        )
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.window.date = date;
        self.recompute();
    }

    pub fn set_start(&mut self, start: TimeOfDay) {
        self.window.start = start;
        self.recompute();
    }

    pub fn set_end(&mut self, end: TimeOfDay) {
        self.window.end = end;
        self.recompute();
    }

    /// Moves the past-date cutoff, e.g. when the calendar day rolls over.
    pub fn set_today(&mut self, today: NaiveDate) {
        if self.today != today {
            self.today = today;
            self.recompute();
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&WindowError> {
        self.error.as_ref()
    }

    pub fn check(&self) -> Result<TimeWindow, WindowError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.window),
        }
    }

    fn recompute(&mut self) {
        self.error = self
            .window
            .validate(self.today, self.min_session_minutes)
            .err();
    }
}
