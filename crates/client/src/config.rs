//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BOOKNEST_API_URL` - Backend base URL (default: `http://localhost:4002`)
//! - `BOOKNEST_STATE_PATH` - JSON state file for the CLI (default: `booknest-state.json`)
//! - `BOOKNEST_OFFLINE_FALLBACK` - `disabled` or `mock` (default: `disabled`)
//! - `BOOKNEST_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 15)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:4002";
const DEFAULT_STATE_PATH: &str = "booknest-state.json";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What to do when the backend cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfflineFallback {
    /// Surface `NetworkUnavailable`.
    #[default]
    Disabled,
    /// Fabricate a local success (demo mode). Every fabrication logs a warning.
    Mock,
}

impl FromStr for OfflineFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "" => Ok(Self::Disabled),
            "mock" => Ok(Self::Mock),
            other => Err(format!("expected `disabled` or `mock`, got `{other}`")),
        }
    }
}

/// BookNest client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, no trailing slash
    pub api_url: String,
    /// State file used by file-backed storage
    pub state_path: PathBuf,
    /// Behaviour when the backend is unreachable
    pub offline_fallback: OfflineFallback,
    /// Per-request timeout
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            offline_fallback: OfflineFallback::Disabled,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_url = normalize_api_url(&get("BOOKNEST_API_URL", DEFAULT_API_URL))?;
        let state_path = PathBuf::from(get("BOOKNEST_STATE_PATH", DEFAULT_STATE_PATH));
        let offline_fallback = get("BOOKNEST_OFFLINE_FALLBACK", "disabled")
            .parse::<OfflineFallback>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOKNEST_OFFLINE_FALLBACK".to_string(), e))?;
        let timeout_secs = get("BOOKNEST_HTTP_TIMEOUT_SECS", "15")
            .trim()
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BOOKNEST_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BOOKNEST_HTTP_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            state_path,
            offline_fallback,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar("BOOKNEST_API_URL".to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BOOKNEST_API_URL".to_string(),
            format!("unsupported scheme `{}`", parsed.scheme()),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_url, "http://localhost:4002");
        assert_eq!(config.offline_fallback, OfflineFallback::Disabled);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = load(&[("BOOKNEST_API_URL", "https://api.booknest.dev/")]).unwrap();
        assert_eq!(config.api_url, "https://api.booknest.dev");
    }

    #[test]
    fn test_invalid_url() {
        let err = load(&[("BOOKNEST_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "BOOKNEST_API_URL"));

        let err = load(&[("BOOKNEST_API_URL", "ftp://files.booknest.dev")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_offline_fallback_parsing() {
        let config = load(&[("BOOKNEST_OFFLINE_FALLBACK", "MOCK")]).unwrap();
        assert_eq!(config.offline_fallback, OfflineFallback::Mock);
        assert!(load(&[("BOOKNEST_OFFLINE_FALLBACK", "sometimes")]).is_err());
    }

    #[test]
    fn test_timeout() {
        let config = load(&[("BOOKNEST_HTTP_TIMEOUT_SECS", "30")]).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(load(&[("BOOKNEST_HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("BOOKNEST_HTTP_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_state_path() {
        let config = load(&[("BOOKNEST_STATE_PATH", "/tmp/state.json")]).unwrap();
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
    }
}
