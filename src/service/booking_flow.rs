use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::BookingSettings;
use crate::error::{BookingError, WindowError};
use crate::events::queue::{EventBus, ModalEvent};
use crate::models::selection::SelectionSet;
use crate::models::session::{CreatedSession, Counterpart, SessionRequest, default_session_name};
use crate::models::time_window::{ResolvedWindow, TimeOfDay};
use crate::service::availability::{AvailabilityFetcher, AvailabilitySnapshot};
use crate::service::backend_service::BookingBackend;
use crate::service::submission::{SessionSubmitter, SubmitState};
use crate::service::time_slot::TimeSlotSelector;

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// One booking attempt with a coach, from open until it is closed.
///
/// Every edit revalidates the window and re-arms the availability query.
/// Once closed, edits are ignored and no further requests are made.
pub struct BookingModal {
    actor_id: Option<String>,
    counterpart: Counterpart,
    timezone: Tz,
    min_session_minutes: u16,
    today: Clock,
    selector: TimeSlotSelector,
    fetcher: AvailabilityFetcher,
    selection: SelectionSet,
    display_name: String,
    submitter: SessionSubmitter,
    events: EventBus,
    closed: bool,
}

impl BookingModal {
    pub async fn open(
        settings: &BookingSettings,
        counterpart: Counterpart,
        backend: Arc<dyn BookingBackend>,
    ) -> (Self, mpsc::Receiver<ModalEvent>) {
        let tz = settings.timezone;
        Self::open_with_clock(settings, counterpart, backend, move || {
            Utc::now().with_timezone(&tz).date_naive()
        })
        .await
    }

    /// Opens with a fixed "today" for the past-date check.
    pub async fn open_on(
        settings: &BookingSettings,
        counterpart: Counterpart,
        backend: Arc<dyn BookingBackend>,
        today: NaiveDate,
    ) -> (Self, mpsc::Receiver<ModalEvent>) {
        Self::open_with_clock(settings, counterpart, backend, move || today).await
    }

    /// `today` is consulted again on every edit and on submit, so a booking
    /// left open past midnight cannot book the day that just ended.
    pub async fn open_with_clock<F>(
        settings: &BookingSettings,
        counterpart: Counterpart,
        backend: Arc<dyn BookingBackend>,
        today: F,
    ) -> (Self, mpsc::Receiver<ModalEvent>)
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        let (events, rx) = EventBus::new(4);
        let opened_on = today();
        info!(coach_id = %counterpart.id, "booking opened");
        let mut modal = Self {
            actor_id: settings.actor_id.clone(),
            counterpart,
            timezone: settings.timezone,
            min_session_minutes: settings.min_session_minutes,
            today: Box::new(today),
            selector: TimeSlotSelector::with_defaults(opened_on, settings.min_session_minutes),
            fetcher: AvailabilityFetcher::new(backend.clone(), settings.debounce),
            selection: SelectionSet::new(),
            display_name: String::new(),
            submitter: SessionSubmitter::new(backend),
            events,
            closed: false,
        };
        modal.refresh_availability().await;
        (modal, rx)
    }

    pub async fn set_date(&mut self, date: NaiveDate) {
        if self.closed {
            return;
        }
        self.selector.set_date(date);
        self.refresh_availability().await;
    }

    pub async fn set_start(&mut self, start: TimeOfDay) {
        if self.closed {
            return;
        }
        self.selector.set_start(start);
        self.refresh_availability().await;
    }

    pub async fn set_end(&mut self, end: TimeOfDay) {
        if self.closed {
            return;
        }
        self.selector.set_end(end);
        self.refresh_availability().await;
    }

    async fn refresh_availability(&mut self) {
        let window = self.checked_window().ok();
        self.fetcher.refresh(window, self.actor_id.as_deref()).await;
    }

    fn checked_window(&mut self) -> Result<ResolvedWindow, WindowError> {
        self.selector.set_today((self.today)());
        self.selector
            .check()
            .and_then(|window| window.resolve_for_session(self.timezone, self.min_session_minutes))
    }

    pub fn selector(&self) -> &TimeSlotSelector {
        &self.selector
    }

    pub fn validation_error(&self) -> Option<String> {
        self.selector
            .check()
            .and_then(|window| window.resolve_for_session(self.timezone, self.min_session_minutes))
            .err()
            .map(|err| err.to_string())
    }

    pub async fn availability(&self) -> AvailabilitySnapshot {
        self.fetcher.snapshot().await
    }

    pub async fn wait_for_availability(&mut self) -> AvailabilitySnapshot {
        self.fetcher.settled().await
    }

    /// Toggles a friend who appears in the current availability list.
    /// Returns whether the friend is selected afterwards.
    pub async fn toggle_collaborator(&mut self, id: &str) -> bool {
        if self.closed {
            return false;
        }
        let snapshot = self.fetcher.snapshot().await;
        if !self.selection.contains(id) && !snapshot.collaborators.iter().any(|c| c.id == id) {
            debug!(collaborator_id = %id, "ignoring toggle for unavailable friend");
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn selected(&self) -> Vec<String> {
        self.selection.ids()
    }

    pub fn set_display_name(&mut self, name: &str) {
        self.display_name = name.to_string();
    }

    pub fn display_name(&self) -> String {
        if self.display_name.trim().is_empty() {
            default_session_name(&self.counterpart.name)
        } else {
            self.display_name.trim().to_string()
        }
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submitter.state()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.submitter.last_error()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Books the session. On success the booking closes; on failure it stays
    /// open with every selection intact.
    pub async fn submit(&mut self) -> Result<CreatedSession, BookingError> {
        if self.closed {
            return Err(BookingError::Closed);
        }
        let window = match self.checked_window() {
            Ok(window) => window,
            Err(err) => {
                // the date may have just slipped into the past
                self.fetcher.refresh(None, None).await;
                return Err(self.submitter.reject(err.into()));
            }
        };
        let Some(actor_id) = self.actor_id.clone() else {
            return Err(self.submitter.reject(BookingError::NotSignedIn));
        };

        // A valid window always has a query scheduled or answered; prune
        // against its answer, never against a list that is still loading.
        let snapshot = self.fetcher.settled().await;
        if snapshot.error.is_none() && !snapshot.loading {
            self.selection.retain_available(&snapshot.collaborators);
        }

        let request = SessionRequest::new(
            &actor_id,
            &self.counterpart,
            &self.selection,
            &self.display_name(),
            &window,
        );
        let created = self.submitter.submit(request).await?;
        self.finish(true, created.id.clone()).await;
        Ok(created)
    }

    pub async fn close(&mut self) {
        self.finish(false, None).await;
    }

    async fn finish(&mut self, booked: bool, session_id: Option<String>) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.fetcher.cancel().await;
        self.selection.clear();
        info!(coach_id = %self.counterpart.id, booked, "booking closed");
        self.events
            .emit(ModalEvent::Closed { booked, session_id })
            .await;
    }
}
