use thiserror::Error;

pub const CONFLICT_MESSAGE: &str = "This coach is already booked for the selected time";
pub const GENERIC_BOOKING_MESSAGE: &str = "Failed to book session";

/// Reasons a proposed time window is rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("Session must be at least {minimum} minutes")]
    TooShort { minimum: u16 },

    #[error("Date cannot be in the past")]
    DateInPast,

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("{0} does not exist in the configured time zone")]
    NonexistentLocalTime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Conflict with an existing booking")]
    Conflict { message: Option<String> },

    #[error("Request failed with status {status}")]
    Server { status: u16, message: Option<String> },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error(transparent)]
    InvalidWindow(#[from] WindowError),

    #[error("You must be signed in to book a session")]
    NotSignedIn,

    #[error("This booking has already been closed")]
    Closed,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl BookingError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BookingError::Backend(BackendError::Conflict { .. }))
    }

    /// Text shown to the user for a failed booking attempt.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Backend(BackendError::Conflict { .. }) => CONFLICT_MESSAGE.to_string(),
            BookingError::Backend(BackendError::Server {
                message: Some(message),
                ..
            }) => message.clone(),
            BookingError::Backend(BackendError::Transport(reason)) => {
                format!("{}: {}", GENERIC_BOOKING_MESSAGE, reason)
            }
            BookingError::Backend(_) => GENERIC_BOOKING_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
