#![allow(non_snake_case)]

mod cli;

use std::env;
use std::process::ExitCode;

use coachBooker::config::{AppConfig, BookingSettings, DEFAULT_LOG_FILTER};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let (config, config_error) = match env::var("CONFIG_FILE") {
        Ok(path) => match AppConfig::from_file(&path) {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
        Err(_) => (AppConfig::default(), None),
    };

    let filter = config
        .get("RUST_LOG")
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "ignoring config file, falling back to environment");
    }

    let settings = match BookingSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    cli::cli(settings).await
}
