//! Client configuration
//!
//! Configuration can be built in code, loaded from YAML, and overridden from
//! the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `TTS_API_BASE_URL` | `base_url` | `http://localhost:8000` |
//! | `TTS_HTTP_TIMEOUT_SECS` | `http_timeout_secs` | 30 |
//! | `TTS_REQUEST_TIMEOUT_SECS` | `request_timeout_ms` | 60s |
//! | `TTS_DOWNLOAD_DIR` | `download_dir` | `.` |

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Port the service listens on when the client runs against a local host.
pub const LOCAL_SERVICE_PORT: u16 = 8000;

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub http_timeout_secs: u64,
    /// Upper bound for a whole catalog load or synthesis call.
    pub request_timeout_ms: u64,
    pub default_language: String,
    pub default_voice: String,
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{}", LOCAL_SERVICE_PORT),
            http_timeout_secs: 30,
            request_timeout_ms: 60_000,
            default_language: "en-GB".to_string(),
            default_voice: "Ryan (Male)".to_string(),
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TTS_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a YAML document; missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Apply overrides from an arbitrary key lookup. Unparsable numbers are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TTS_API_BASE_URL").filter(|s| !s.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("TTS_HTTP_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            self.http_timeout_secs = secs;
        }
        if let Some(secs) = lookup("TTS_REQUEST_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok())
        {
            self.request_timeout_ms = secs.saturating_mul(1000);
        }
        if let Some(dir) = lookup("TTS_DOWNLOAD_DIR").filter(|s| !s.is_empty()) {
            self.download_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Derive the base URL from the origin the client was served from.
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        self.base_url = resolve_base_url(origin)?;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn with_defaults(mut self, language: impl Into<String>, voice: impl Into<String>) -> Self {
        self.default_language = language.into();
        self.default_voice = voice.into();
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "Base URL must use http or https",
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(url.scheme().to_string()),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "HTTP timeout must be positive",
                ErrorContext::new().with_field_path("config.http_timeout_secs"),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::configuration_with_context(
                "Request timeout must be positive",
                ErrorContext::new().with_field_path("config.request_timeout_ms"),
            ));
        }
        Ok(())
    }
}

/// Resolve the service base URL from a page origin.
///
/// Local hosts talk to the service on its development port; any other origin
/// serves the API itself.
pub fn resolve_base_url(origin: &str) -> Result<String> {
    let url = Url::parse(origin).map_err(|e| {
        Error::configuration_with_context(
            format!("Invalid origin: {}", e),
            ErrorContext::new().with_details(origin.to_string()),
        )
    })?;
    let host = url.host_str().ok_or_else(|| {
        Error::configuration_with_context(
            "Origin has no host",
            ErrorContext::new().with_details(origin.to_string()),
        )
    })?;

    if LOCAL_HOSTS.contains(&host) {
        return Ok(format!("http://{}:{}", host, LOCAL_SERVICE_PORT));
    }
    Ok(url.origin().ascii_serialization())
}
