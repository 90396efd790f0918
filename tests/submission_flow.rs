use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use coachBooker::config::BookingSettings;
use coachBooker::error::{BackendError, BookingError, CONFLICT_MESSAGE, GENERIC_BOOKING_MESSAGE, WindowError};
use coachBooker::events::queue::ModalEvent;
use coachBooker::models::collaborator::Collaborator;
use coachBooker::models::session::{CreatedSession, Counterpart, SessionRequest};
use coachBooker::models::time_window::ResolvedWindow;
use coachBooker::service::backend_service::BookingBackend;
use coachBooker::service::booking_flow::BookingModal;
use coachBooker::service::submission::SubmitState;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{Duration, sleep};

struct FakeBackend {
    friends: Mutex<Vec<Collaborator>>,
    response: Mutex<Result<CreatedSession, BackendError>>,
    availability_calls: Mutex<usize>,
    submissions: Mutex<Vec<SessionRequest>>,
}

impl FakeBackend {
    fn new(response: Result<CreatedSession, BackendError>) -> Self {
        Self {
            friends: Mutex::new(vec![friend("f1", "Ana"), friend("f2", "Ben")]),
            response: Mutex::new(response),
            availability_calls: Mutex::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn set_response(&self, response: Result<CreatedSession, BackendError>) {
        *self.response.lock().unwrap() = response;
    }

    fn set_friends(&self, friends: Vec<Collaborator>) {
        *self.friends.lock().unwrap() = friends;
    }

    fn calls(&self) -> usize {
        *self.availability_calls.lock().unwrap() + self.submissions.lock().unwrap().len()
    }

    fn submissions(&self) -> Vec<SessionRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BookingBackend for FakeBackend {
    async fn available_collaborators(
        &self,
        _actor_id: &str,
        _window: &ResolvedWindow,
    ) -> Result<Vec<Collaborator>, BackendError> {
        *self.availability_calls.lock().unwrap() += 1;
        Ok(self.friends.lock().unwrap().clone())
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<CreatedSession, BackendError> {
        self.submissions.lock().unwrap().push(request.clone());
        self.response.lock().unwrap().clone()
    }
}

fn friend(id: &str, name: &str) -> Collaborator {
    Collaborator {
        id: id.to_string(),
        name: name.to_string(),
        avatar: Some(format!("https://cdn.test/{}.png", id)),
    }
}

fn coach() -> Counterpart {
    Counterpart {
        id: "coach-1".to_string(),
        name: "Dana".to_string(),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn settings() -> BookingSettings {
    BookingSettings::new("http://backend.test").with_actor("user-1")
}

fn created(id: &str) -> Result<CreatedSession, BackendError> {
    Ok(CreatedSession {
        id: Some(id.to_string()),
    })
}

#[tokio::test(start_paused = true)]
async fn success_closes_once_and_goes_quiet() {
    let backend = Arc::new(FakeBackend::new(created("s-42")));
    let (mut modal, mut events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.set_date(today().succ_opt().unwrap()).await;
    modal.wait_for_availability().await;
    modal.toggle_collaborator("f1").await;
    modal.set_display_name("Morning intervals");

    let session = modal.submit().await.expect("booking should succeed");
    assert_eq!(session.id.as_deref(), Some("s-42"));
    assert!(modal.is_closed());
    assert_eq!(modal.submit_state(), SubmitState::Closed);

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0],
        SessionRequest {
            user_id: "user-1".to_string(),
            coach_id: "coach-1".to_string(),
            friend_ids: vec!["f1".to_string()],
            session_name: "Morning intervals".to_string(),
            start_time: "2026-10-20T09:00:00.000Z".to_string(),
            end_time: "2026-10-20T10:00:00.000Z".to_string(),
        }
    );

    assert_eq!(
        events.try_recv(),
        Ok(ModalEvent::Closed {
            booked: true,
            session_id: Some("s-42".to_string()),
        })
    );

    let calls_after_success = backend.calls();
    modal.set_end("11:00".parse().unwrap()).await;
    modal.close().await;
    assert!(matches!(modal.submit().await, Err(BookingError::Closed)));
    sleep(Duration::from_secs(5)).await;

    assert_eq!(backend.calls(), calls_after_success);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn conflict_shows_coach_already_booked() {
    let backend = Arc::new(FakeBackend::new(Err(BackendError::Conflict {
        message: Some("Time slot unavailable".to_string()),
    })));
    let (mut modal, mut events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.wait_for_availability().await;

    let err = modal.submit().await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.user_message(), CONFLICT_MESSAGE);
    assert_ne!(err.user_message(), GENERIC_BOOKING_MESSAGE);
    assert_eq!(modal.last_error(), Some(CONFLICT_MESSAGE));
    assert!(!modal.is_closed());
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn generic_failure_keeps_state_and_allows_another_attempt() {
    let backend = Arc::new(FakeBackend::new(Err(BackendError::Server {
        status: 500,
        message: Some("Coach calendar unavailable".to_string()),
    })));
    let (mut modal, mut events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.wait_for_availability().await;
    modal.toggle_collaborator("f2").await;

    let err = modal.submit().await.unwrap_err();
    assert_eq!(err.user_message(), "Coach calendar unavailable");
    assert_eq!(modal.submit_state(), SubmitState::Idle);
    assert_eq!(modal.selected(), vec!["f2".to_string()]);
    assert!(modal.selector().is_valid());
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.submissions().len(), 1);

    backend.set_response(created("s-1"));
    modal.submit().await.expect("second attempt should succeed");
    assert_eq!(backend.submissions().len(), 2);
    assert_eq!(backend.submissions()[1].friend_ids, vec!["f2".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn invalid_window_is_refused_before_any_request() {
    let backend = Arc::new(FakeBackend::new(created("never")));
    let (mut modal, _events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.set_end("09:15".parse().unwrap()).await;

    let err = modal.submit().await.unwrap_err();
    assert_eq!(err, BookingError::InvalidWindow(WindowError::TooShort { minimum: 30 }));
    assert_eq!(modal.last_error(), Some("Session must be at least 30 minutes"));
    assert!(backend.submissions().is_empty());
    assert!(!modal.is_closed());
}

#[tokio::test(start_paused = true)]
async fn signed_out_user_cannot_book() {
    let backend = Arc::new(FakeBackend::new(created("never")));
    let anonymous = BookingSettings::new("http://backend.test");
    let (mut modal, _events) = BookingModal::open_on(&anonymous, coach(), backend.clone(), today()).await;

    assert_eq!(modal.submit().await, Err(BookingError::NotSignedIn));
    assert!(backend.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blank_name_falls_back_to_coach_name() {
    let backend = Arc::new(FakeBackend::new(created("s-2")));
    let (mut modal, _events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.set_display_name("   ");
    modal.submit().await.unwrap();
    assert_eq!(backend.submissions()[0].session_name, "Session with Dana");
}

#[tokio::test(start_paused = true)]
async fn closing_without_booking_signals_once() {
    let backend = Arc::new(FakeBackend::new(created("never")));
    let (mut modal, mut events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.close().await;
    modal.close().await;

    assert_eq!(
        events.try_recv(),
        Ok(ModalEvent::Closed {
            booked: false,
            session_id: None,
        })
    );
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn submit_during_a_pending_refresh_keeps_available_invitees() {
    let backend = Arc::new(FakeBackend::new(created("s-3")));
    let (mut modal, _events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.wait_for_availability().await;
    assert!(modal.toggle_collaborator("f1").await);

    // invalid then valid again: the list is cleared and a new lookup is pending
    modal.set_end("09:15".parse().unwrap()).await;
    modal.set_end("10:00".parse().unwrap()).await;
    assert!(modal.availability().await.collaborators.is_empty());

    modal.submit().await.expect("booking should succeed");
    assert_eq!(backend.submissions()[0].friend_ids, vec!["f1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn friend_who_is_no_longer_free_is_not_invited() {
    let backend = Arc::new(FakeBackend::new(Err(BackendError::Server {
        status: 503,
        message: None,
    })));
    let (mut modal, _events) = BookingModal::open_on(&settings(), coach(), backend.clone(), today()).await;
    modal.wait_for_availability().await;
    modal.toggle_collaborator("f1").await;
    modal.toggle_collaborator("f2").await;

    backend.set_friends(vec![friend("f2", "Ben")]);
    modal.set_end("11:00".parse().unwrap()).await;

    modal.submit().await.unwrap_err();
    assert_eq!(backend.submissions()[0].friend_ids, vec!["f2".to_string()]);
    assert_eq!(modal.selected(), vec!["f2".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn date_that_slipped_into_the_past_is_refused() {
    let backend = Arc::new(FakeBackend::new(created("never")));
    let clock = Arc::new(Mutex::new(today()));
    let reader = clock.clone();
    let (mut modal, _events) = BookingModal::open_with_clock(&settings(), coach(), backend.clone(), move || {
        *reader.lock().unwrap()
    })
    .await;
    modal.wait_for_availability().await;
    assert!(modal.selector().is_valid());

    *clock.lock().unwrap() = today().checked_add_days(Days::new(1)).unwrap();

    let err = modal.submit().await.unwrap_err();
    assert_eq!(err, BookingError::InvalidWindow(WindowError::DateInPast));
    assert!(backend.submissions().is_empty());
    assert!(!modal.is_closed());
}
