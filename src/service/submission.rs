use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::session::{CreatedSession, SessionRequest};
use crate::service::backend_service::BookingBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Closed,
}

/// Sends one create-session request per confirmation. Nothing is retried;
/// a failure returns to `Idle` so the user can try again.
pub struct SessionSubmitter {
    backend: Arc<dyn BookingBackend>,
    state: SubmitState,
    last_error: Option<String>,
}

impl SessionSubmitter {
    pub fn new(backend: Arc<dyn BookingBackend>) -> Self {
        Self {
            backend,
            state: SubmitState::Idle,
            last_error: None,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Records a failure that was caught before any request was made.
    pub fn reject(&mut self, err: BookingError) -> BookingError {
        self.last_error = Some(err.user_message());
        err
    }

    pub async fn submit(&mut self, request: SessionRequest) -> Result<CreatedSession, BookingError> {
        if self.state == SubmitState::Closed {
            return Err(BookingError::Closed);
        }
        self.state = SubmitState::Submitting;
        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            coach_id = %request.coach_id,
            friends = request.friend_ids.len(),
            start = %request.start_time,
            end = %request.end_time,
            "submitting session booking"
        );

        match self.backend.create_session(&request).await {
            Ok(created) => {
                info!(%request_id, session_id = ?created.id, "session booked");
                self.state = SubmitState::Closed;
                self.last_error = None;
                Ok(created)
            }
            Err(err) => {
                let err = BookingError::from(err);
                if err.is_conflict() {
                    warn!(%request_id, "coach already booked for this window");
                } else {
                    warn!(%request_id, error = %err, "session booking failed");
                }
                self.state = SubmitState::Idle;
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }
}
