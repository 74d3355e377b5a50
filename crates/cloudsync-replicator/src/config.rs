//! Client and monitoring configuration.
//!
//! [`ClientConfig`] defaults to the production Cloud Sync endpoints and can be
//! overridden from the environment. Secrets are never read here: callers pass
//! the refresh token explicitly (see [`load_secret`] for the file-mounted
//! convention).

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::constants;

/// Endpoints and HTTP behaviour for the Cloud Sync client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Auth0 token endpoint
    pub token_url: String,
    /// Accounts endpoint
    pub accounts_url: String,
    /// Relationship API base, without trailing slash
    pub api_base_url: String,
    /// OAuth client ID sent with the refresh grant
    pub client_id: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Log every raw API response at info level
    pub log_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token_url: constants::TOKEN_URL.to_string(),
            accounts_url: constants::ACCOUNTS_URL.to_string(),
            api_base_url: constants::API_BASE_URL.to_string(),
            client_id: constants::CLIENT_ID.to_string(),
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
            log_responses: false,
        }
    }
}

impl ClientConfig {
    /// Point every endpoint at a single base URL, using the Cloud Sync path
    /// layout (`/oauth/token`, `/api/accounts`, `/api/...`).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token_url: format!("{base}/oauth/token"),
            accounts_url: format!("{base}/api/accounts"),
            api_base_url: format!("{base}/api"),
            ..Self::default()
        }
    }

    pub fn log_responses(mut self, enabled: bool) -> Self {
        self.log_responses = enabled;
        self
    }

    /// Load configuration from environment variables, falling back to the
    /// production defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let token_url = url_var("CLOUD_SYNC_TOKEN_URL", defaults.token_url)?;
        let accounts_url = url_var("CLOUD_SYNC_ACCOUNTS_URL", defaults.accounts_url)?;
        let api_base_url = url_var("CLOUD_SYNC_API_URL", defaults.api_base_url)?
            .trim_end_matches('/')
            .to_string();

        let client_id = env::var("CLOUD_SYNC_CLIENT_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.client_id);

        let request_timeout = match env::var("CLOUD_SYNC_HTTP_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(parse_number("CLOUD_SYNC_HTTP_TIMEOUT_SECS", &value)?),
            Err(_) => defaults.request_timeout,
        };

        let log_responses = env::var("CLOUD_SYNC_LOG_RESPONSES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            token_url,
            accounts_url,
            api_base_url,
            client_id,
            request_timeout,
            log_responses,
        })
    }
}

fn url_var(name: &'static str, default: String) -> Result<String, ConfigError> {
    let value = env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or(default);
    Url::parse(&value).map_err(|_| ConfigError::InvalidUrl(value.clone()))?;
    Ok(value)
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

/// How the completion poller should behave.
///
/// The defaults reproduce the unbounded behaviour: wait for completion,
/// query every 60 seconds, no attempt limit and no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub wait_for_completion: bool,
    pub interval: Duration,
    /// Give up with [`crate::PollOutcome::StillRunning`] after this many queries.
    pub max_attempts: Option<u32>,
    /// Give up with [`crate::PollOutcome::StillRunning`] once this much time has passed.
    pub deadline: Option<Duration>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            wait_for_completion: true,
            interval: constants::DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            deadline: None,
        }
    }
}

impl MonitorOptions {
    /// Query once and report whatever is observed.
    pub fn check_once() -> Self {
        Self {
            wait_for_completion: false,
            ..Self::default()
        }
    }

    pub fn wait_for_completion(mut self, wait: bool) -> Self {
        self.wait_for_completion = wait;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Read a file-mounted secret (e.g. `/mnt/secret/refreshToken`), trimming
/// surrounding whitespace.
pub fn load_secret(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let secret = raw.trim().to_string();
    if secret.is_empty() {
        return Err(ConfigError::EmptySecret(path.to_path_buf()));
    }
    Ok(secret)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid number for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("secret file {} is empty", .0.display())]
    EmptySecret(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_point_at_production() {
        let config = ClientConfig::default();
        assert_eq!(config.token_url, constants::TOKEN_URL);
        assert_eq!(config.api_base_url, "https://cloudsync.netapp.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.log_responses);
    }

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.token_url, "http://127.0.0.1:9000/oauth/token");
        assert_eq!(config.accounts_url, "http://127.0.0.1:9000/api/accounts");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.client_id, constants::CLIENT_ID);
    }

    #[test]
    fn test_monitor_defaults_are_unbounded() {
        let opts = MonitorOptions::default();
        assert!(opts.wait_for_completion);
        assert_eq!(opts.interval, Duration::from_secs(60));
        assert_eq!(opts.max_attempts, None);
        assert_eq!(opts.deadline, None);
        assert!(!MonitorOptions::check_once().wait_for_completion);
    }

    #[test]
    fn test_load_secret_trims_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  rt-secret-value  ").unwrap();
        assert_eq!(load_secret(file.path()).unwrap(), "rt-secret-value");
    }

    #[test]
    fn test_load_secret_rejects_blank_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        assert!(matches!(
            load_secret(file.path()),
            Err(ConfigError::EmptySecret(_))
        ));
    }

    #[test]
    fn test_load_secret_missing_file() {
        let err = load_secret("/nonexistent/refreshToken").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/refreshToken"));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number("X", " 45 ").unwrap(), 45);
        assert!(matches!(
            parse_number("X", "soon"),
            Err(ConfigError::InvalidNumber { var: "X", .. })
        ));
    }
}
