use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::models::time_window::DEFAULT_MIN_SESSION_MINUTES;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Values read from a `KEY=VALUE` file, with the process environment as
/// fallback for anything the file does not set.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub backend_url: String,
    pub actor_id: Option<String>,
    pub timezone: Tz,
    pub debounce: Duration,
    pub min_session_minutes: u16,
    pub request_timeout: Option<Duration>,
}

impl BookingSettings {
    pub fn new(backend_url: &str) -> Self {
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            actor_id: None,
            timezone: Tz::UTC,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_session_minutes: DEFAULT_MIN_SESSION_MINUTES,
            request_timeout: None,
        }
    }

    pub fn with_actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let backend_url = config
            .get("BACKEND_URL")
            .ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let mut settings = Self::new(&backend_url);
        settings.actor_id = config.get("ACTOR_ID");
        if let Some(tz) = config.get("USER_TIMEZONE") {
            settings.timezone = tz.parse().map_err(|_| ConfigError::InvalidValue {
                key: "USER_TIMEZONE",
                value: tz.clone(),
            })?;
        }
        if let Some(ms) = config.get("AVAILABILITY_DEBOUNCE_MS") {
            settings.debounce = Duration::from_millis(parse_number("AVAILABILITY_DEBOUNCE_MS", &ms)?);
        }
        if let Some(minutes) = config.get("MIN_SESSION_MINUTES") {
            settings.min_session_minutes = parse_number("MIN_SESSION_MINUTES", &minutes)?;
        }
        if let Some(secs) = config.get("REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = Some(Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &secs)?));
        }
        Ok(settings)
    }

    /// The current calendar date in the user's time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
