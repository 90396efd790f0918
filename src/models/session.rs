use serde::{Deserialize, Serialize};

use crate::models::selection::SelectionSet;
use crate::models::time_window::ResolvedWindow;

/// The coach the session is booked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterpart {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub user_id: String,
    pub coach_id: String,
    pub friend_ids: Vec<String>,
    pub session_name: String,
    pub start_time: String,
    pub end_time: String,
}

impl SessionRequest {
    pub fn new(
        actor_id: &str,
        counterpart: &Counterpart,
        selection: &SelectionSet,
        session_name: &str,
        window: &ResolvedWindow,
    ) -> Self {
        Self {
            user_id: actor_id.to_string(),
            coach_id: counterpart.id.clone(),
            friend_ids: selection.ids(),
            session_name: session_name.to_string(),
            start_time: window.start_iso(),
            end_time: window.end_iso(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedSession {
    #[serde(default)]
    pub id: Option<String>,
}

pub fn default_session_name(counterpart_name: &str) -> String {
    format!("Session with {}", counterpart_name)
}
