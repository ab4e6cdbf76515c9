use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure talking to the forecast data source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode JSON response from {url}: {body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Period '{period}' has a non-integer temperature: {value}")]
    Temperature { period: String, value: String },
}

/// Failure computing sunrise/sunset for a single date. Never fatal to a run.
#[derive(Debug, Error)]
pub enum SunTimeError {
    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid UTC offset: {0} hours")]
    InvalidOffset(f64),

    #[error("The sun does not {event} on {date} at this location")]
    NoEvent { event: &'static str, date: NaiveDate },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine platform config directory")]
    NoConfigDir,

    #[error("Failed to read config file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal pipeline failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum WxCalError {
    #[error("failed to get forecast")]
    Fetch(#[source] FetchError),

    #[error("failed to normalize forecast")]
    Normalize(#[from] NormalizeError),

    #[error("failed to write output file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
