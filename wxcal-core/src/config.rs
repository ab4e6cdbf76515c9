use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{error::ConfigError, retry::RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.weather.gov";

/// Everything one run needs to know about the calendars it generates.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConfig {
    /// Display name of the location, e.g. "Ann Arbor, MI".
    pub location: String,
    /// Domain used to build globally unique calendar/event ids.
    pub domain: String,
    pub title_prefix: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub weather_output: PathBuf,
    /// Sunrise/sunset calendar is only generated when this is set.
    pub sun_output: Option<PathBuf>,
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Contact address sent in the User-Agent, as weather.gov asks of API clients.
    pub contact_email: Option<String>,
    pub force_ipv4: bool,
    pub timeout_secs: u64,
    pub base_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            contact_email: None,
            force_ipv4: false,
            timeout_secs: 5,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 20,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy::new(settings.attempts, Duration::from_secs(settings.delay_secs))
    }
}

/// Optional on-disk configuration.
///
/// Example TOML:
/// ```toml
/// [client]
/// contact_email = "me@example.com"
/// force_ipv4 = true
///
/// [retry]
/// attempts = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientOptions,
    pub retry: RetrySettings,
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "wxcal", "wxcal").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_weather_gov_client() {
        let cfg = Config::default();
        assert_eq!(cfg.client.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.client.timeout(), Duration::from_secs(5));
        assert!(!cfg.client.force_ipv4);
        assert_eq!(cfg.retry_policy(), RetryPolicy::new(3, Duration::from_secs(20)));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let cfg = Config::parse(
            r#"
            [client]
            contact_email = "me@example.com"
            force_ipv4 = true

            [retry]
            attempts = 5
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.client.contact_email.as_deref(), Some("me@example.com"));
        assert!(cfg.client.force_ipv4);
        assert_eq!(cfg.client.timeout_secs, 5);
        assert_eq!(cfg.retry.attempts, 5);
        assert_eq!(cfg.retry.delay_secs, 20);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn load_from_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\ntimeout_secs = 9").unwrap();

        let cfg = Config::load_from(file.path()).expect("should load");
        assert_eq!(cfg.client.timeout_secs, 9);
    }

    #[test]
    fn load_from_missing_file_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nattempts = \"many\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
