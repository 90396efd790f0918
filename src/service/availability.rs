use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::collaborator::Collaborator;
use crate::models::time_window::ResolvedWindow;
use crate::service::backend_service::BookingBackend;
use crate::tasks::debounce::Debouncer;

pub const AVAILABILITY_ERROR_MESSAGE: &str = "Failed to load available friends";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    pub collaborators: Vec<Collaborator>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct AvailabilityState {
    generation: u64,
    snapshot: AvailabilitySnapshot,
}

/// Debounced lookup of which friends are free for a window.
///
/// Every call to [`AvailabilityFetcher::refresh`] starts a new generation.
/// Only the query belonging to the newest generation may write results, so a
/// slow response can never replace the answer to a later window.
pub struct AvailabilityFetcher {
    backend: Arc<dyn BookingBackend>,
    debouncer: Debouncer,
    state: Arc<Mutex<AvailabilityState>>,
}

impl AvailabilityFetcher {
    pub fn new(backend: Arc<dyn BookingBackend>, quiescence: Duration) -> Self {
        Self {
            backend,
            debouncer: Debouncer::new(quiescence),
            state: Arc::new(Mutex::new(AvailabilityState::default())),
        }
    }

    /// Reacts to a change of window or actor. Without both, the list is
    /// cleared right away and nothing is sent.
    pub async fn refresh(&mut self, window: Option<ResolvedWindow>, actor_id: Option<&str>) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        let generation = state.generation;

        let actor_id = actor_id.map(str::trim).filter(|id| !id.is_empty());
        let (Some(window), Some(actor_id)) = (window, actor_id) else {
            self.debouncer.cancel();
            state.snapshot = AvailabilitySnapshot::default();
            debug!(generation, "availability cleared");
            return;
        };

        state.snapshot.loading = true;
        state.snapshot.error = None;
        drop(state);

        let backend = self.backend.clone();
        let shared = self.state.clone();
        let actor_id = actor_id.to_string();
        debug!(
            generation,
            delay_ms = self.debouncer.delay().as_millis() as u64,
            "availability query scheduled"
        );
        self.debouncer.schedule(async move {
            info!(
                actor_id = %actor_id,
                start = %window.start_iso(),
                end = %window.end_iso(),
                "querying available friends"
            );
            let result = backend.available_collaborators(&actor_id, &window).await;

            let mut state = shared.lock().await;
            if state.generation != generation {
                debug!(generation, latest = state.generation, "discarding stale availability response");
                return;
            }
            state.snapshot.loading = false;
            match result {
                Ok(collaborators) => {
                    info!(count = collaborators.len(), "available friends loaded");
                    state.snapshot.collaborators = collaborators;
                    state.snapshot.error = None;
                }
                Err(err) => {
                    warn!(error = %err, "availability query failed");
                    state.snapshot.collaborators.clear();
                    state.snapshot.error = Some(AVAILABILITY_ERROR_MESSAGE.to_string());
                }
            }
        });
    }

    /// Drops any scheduled or in-flight query without touching the current list.
    pub async fn cancel(&mut self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.snapshot.loading = false;
        self.debouncer.cancel();
    }

    pub async fn snapshot(&self) -> AvailabilitySnapshot {
        self.state.lock().await.snapshot.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Waits for the scheduled query, if any, and returns the resulting state.
    pub async fn settled(&mut self) -> AvailabilitySnapshot {
        self.debouncer.settle().await;
        self.snapshot().await
    }
}
