//! Application configuration.
//!
//! Use the builder pattern to customize behavior, or [`AppConfig::from_env`]
//! to read the `SIGHTLINE_*` environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::models::AgentMode;

/// Default inactivity window before an in-flight stream is failed.
const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default lifetime of transient user notices.
const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

/// Configuration for the client core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend API base URL.
    pub base_url: String,
    /// URL the host application itself is served from. Embeds resolving to
    /// this origin and path are rejected.
    pub app_url: Option<String>,
    /// Override for the persistence directory.
    pub data_dir: Option<PathBuf>,
    /// Maximum silence between stream events before the request is failed.
    pub stream_idle_timeout: Duration,
    /// Lifetime of transient notices before auto-dismissal.
    pub notice_ttl: Duration,
    /// Which backend agent answers requests.
    pub mode: AgentMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: crate::client::DEFAULT_BASE_URL.to_string(),
            app_url: None,
            data_dir: None,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
            notice_ttl: DEFAULT_NOTICE_TTL,
            mode: AgentMode::Supervisor,
        }
    }
}

impl AppConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the host application URL used for the embed self-origin check.
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    /// Set the persistence directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the stream inactivity timeout.
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    /// Set the agent mode.
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Read configuration from `SIGHTLINE_*` environment variables.
    ///
    /// - `SIGHTLINE_BASE_URL` - backend base URL
    /// - `SIGHTLINE_APP_URL` - host application URL
    /// - `SIGHTLINE_DATA_DIR` - persistence directory
    /// - `SIGHTLINE_STREAM_TIMEOUT_SECS` - inactivity timeout in seconds
    /// - `SIGHTLINE_MOCK=1` - use the mocked visualization agent
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SIGHTLINE_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(url) = std::env::var("SIGHTLINE_APP_URL") {
            config.app_url = Some(url);
        }
        if let Ok(dir) = std::env::var("SIGHTLINE_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(secs) = std::env::var("SIGHTLINE_STREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.stream_idle_timeout = Duration::from_secs(secs);
            }
        }
        if std::env::var("SIGHTLINE_MOCK").is_ok() {
            config.mode = AgentMode::QuickSightMock;
        }

        config
    }

    /// The directory threads are persisted under.
    ///
    /// Defaults to `~/.sightline`, falling back to `./data` when no home
    /// directory is available.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(".sightline"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// The parsed host application URL, when configured and well-formed.
    pub fn app_url_parsed(&self) -> Option<Url> {
        self.app_url.as_deref().and_then(|u| Url::parse(u).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, crate::client::DEFAULT_BASE_URL);
        assert!(config.app_url.is_none());
        assert_eq!(config.stream_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.mode, AgentMode::Supervisor);
    }

    #[test]
    fn test_builder_chain() {
        let config = AppConfig::new()
            .with_base_url("http://10.0.0.5:8000")
            .with_app_url("http://localhost:3000")
            .with_data_dir("/tmp/sightline-test")
            .with_stream_idle_timeout(Duration::from_secs(30))
            .with_mode(AgentMode::QuickSightMock);

        assert_eq!(config.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.app_url, Some("http://localhost:3000".to_string()));
        assert_eq!(
            config.resolved_data_dir(),
            PathBuf::from("/tmp/sightline-test")
        );
        assert_eq!(config.stream_idle_timeout, Duration::from_secs(30));
        assert_eq!(config.mode, AgentMode::QuickSightMock);
    }

    #[test]
    fn test_app_url_parsed() {
        let config = AppConfig::new().with_app_url("http://localhost:3000/app");
        let parsed = config.app_url_parsed().expect("parse");
        assert_eq!(parsed.host_str(), Some("localhost"));

        let bad = AppConfig::new().with_app_url("not a url");
        assert!(bad.app_url_parsed().is_none());
    }

    #[test]
    fn test_resolved_data_dir_default_is_stable() {
        let config = AppConfig::default();
        assert_eq!(config.resolved_data_dir(), config.resolved_data_dir());
    }
}
