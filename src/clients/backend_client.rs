use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::models::collaborator::Collaborator;
use crate::models::session::{CreatedSession, SessionRequest};
use crate::models::time_window::ResolvedWindow;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls a human readable message out of an error body, if there is one.
fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

pub async fn fetch_available_friends(
    client: &reqwest::Client,
    base_url: &str,
    actor_id: &str,
    window: &ResolvedWindow,
) -> Result<Vec<Collaborator>, BackendError> {
    let start_time = window.start_iso();
    let end_time = window.end_iso();
    let response = client
        .get(format!("{}/api/friends/available", base_url))
        .query(&[
            ("userId", actor_id),
            ("startTime", start_time.as_str()),
            ("endTime", end_time.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(%status, body = %text, "availability query rejected");
        return Err(BackendError::Server {
            status: status.as_u16(),
            message: server_message(&text),
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        BackendError::Decode(format!("{}; raw body: {}", e, text))
    })
}

pub async fn create_session(
    client: &reqwest::Client,
    base_url: &str,
    request: &SessionRequest,
) -> Result<CreatedSession, BackendError> {
    let response = client
        .post(format!("{}/api/sessions", base_url))
        .json(request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::CONFLICT {
        return Err(BackendError::Conflict {
            message: server_message(&text),
        });
    }

    if !status.is_success() {
        warn!(%status, body = %text, "session creation rejected");
        return Err(BackendError::Server {
            status: status.as_u16(),
            message: server_message(&text),
        });
    }

    // Success bodies vary between deployments; an unreadable one still means booked.
    Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
        debug!(error = %e, "session created without a readable body");
        CreatedSession::default()
    }))
}
