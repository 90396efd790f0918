use async_trait::async_trait;

use crate::clients::backend_client;
use crate::config::BookingSettings;
use crate::error::BackendError;
use crate::models::collaborator::Collaborator;
use crate::models::session::{CreatedSession, SessionRequest};
use crate::models::time_window::ResolvedWindow;

/// The platform backend as seen by the booking flow.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn available_collaborators(
        &self,
        actor_id: &str,
        window: &ResolvedWindow,
    ) -> Result<Vec<Collaborator>, BackendError>;

    async fn create_session(&self, request: &SessionRequest) -> Result<CreatedSession, BackendError>;
}

pub struct BackendService {
    client: reqwest::Client,
    base_url: String,
}

impl BackendService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &BookingSettings) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: settings.backend_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BookingBackend for BackendService {
    async fn available_collaborators(
        &self,
        actor_id: &str,
        window: &ResolvedWindow,
    ) -> Result<Vec<Collaborator>, BackendError> {
        backend_client::fetch_available_friends(&self.client, &self.base_url, actor_id, window).await
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<CreatedSession, BackendError> {
        backend_client::create_session(&self.client, &self.base_url, request).await
    }
}
