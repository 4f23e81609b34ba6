//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STEALTH_API_TARGET` - Which backend to talk to: `local`, `remote` or `device` (default: local)
//! - `STEALTH_LOCAL_URL` - Base URL of a backend on this machine (default: <http://localhost:3000/api>)
//! - `STEALTH_REMOTE_URL` - Base URL of the production backend (required when target is `remote`)
//! - `STEALTH_DEVICE_HOST` - LAN address of the development machine (default: 192.168.1.100)
//! - `STEALTH_DEVICE_PORT` - Port of the backend on the LAN (default: 3000)
//! - `STEALTH_REQUEST_TIMEOUT_SECS` - Per-request timeout ceiling (default: 30)
//! - `STEALTH_ORDER_PAGE_SIZE` - Orders fetched per history page (default: 10)
//! - `STEALTH_SESSION_DIR` - Directory of the persisted session (default: .stealth)

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_LOCAL_URL: &str = "http://localhost:3000/api";
const DEFAULT_DEVICE_HOST: &str = "192.168.1.100";
const DEFAULT_DEVICE_PORT: &str = "3000";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_ORDER_PAGE_SIZE: &str = "10";
const DEFAULT_SESSION_DIR: &str = ".stealth";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backend deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiTarget {
    /// A backend running on this machine.
    #[default]
    Local,
    /// The production backend.
    Remote,
    /// A backend on the development machine, reached over the LAN from a device.
    Device,
}

impl FromStr for ApiTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "localhost" => Ok(Self::Local),
            "remote" | "production" => Ok(Self::Remote),
            "device" => Ok(Self::Device),
            _ => Err(format!("expected local, remote or device (got {s:?})")),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined onto (includes the `/api` prefix).
    pub base_url: Url,
    /// Timeout ceiling for a single request.
    pub request_timeout: Duration,
    /// Number of orders requested per history page.
    pub order_page_size: u32,
    /// Directory holding the persisted session record.
    pub session_dir: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed, or if the
    /// remote target is selected without `STEALTH_REMOTE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let target = parse_env::<ApiTarget>("STEALTH_API_TARGET", "local")?;
        let base_url = match target {
            ApiTarget::Local => {
                parse_url("STEALTH_LOCAL_URL", &get_env_or_default("STEALTH_LOCAL_URL", DEFAULT_LOCAL_URL))?
            }
            ApiTarget::Remote => {
                parse_url("STEALTH_REMOTE_URL", &get_required_env("STEALTH_REMOTE_URL")?)?
            }
            ApiTarget::Device => {
                let host = parse_env::<IpAddr>("STEALTH_DEVICE_HOST", DEFAULT_DEVICE_HOST)?;
                let port = parse_env::<u16>("STEALTH_DEVICE_PORT", DEFAULT_DEVICE_PORT)?;
                device_url(host, port)?
            }
        };

        let timeout_secs = parse_env::<u64>("STEALTH_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let order_page_size = parse_env::<u32>("STEALTH_ORDER_PAGE_SIZE", DEFAULT_ORDER_PAGE_SIZE)?;
        if order_page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STEALTH_ORDER_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let session_dir = PathBuf::from(get_env_or_default("STEALTH_SESSION_DIR", DEFAULT_SESSION_DIR));

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            order_page_size,
            session_dir,
        })
    }

    /// Configuration pointing at an explicit base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` does not parse.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("base_url", base_url)?,
            request_timeout: Duration::from_secs(30),
            order_page_size: 10,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, ensuring it ends with `/` so relative joins keep the path prefix.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Base URL of a development backend reached over the LAN.
fn device_url(host: IpAddr, port: u16) -> Result<Url, ConfigError> {
    let host = match host {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    };
    parse_url("STEALTH_DEVICE_HOST", &format!("http://{host}:{port}/api"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_target_parse() {
        assert_eq!("local".parse::<ApiTarget>().unwrap(), ApiTarget::Local);
        assert_eq!("Production".parse::<ApiTarget>().unwrap(), ApiTarget::Remote);
        assert_eq!("device".parse::<ApiTarget>().unwrap(), ApiTarget::Device);
        assert!("staging".parse::<ApiTarget>().is_err());
    }

    #[test]
    fn test_parse_url_appends_trailing_slash() {
        let url = parse_url("TEST", "http://localhost:3000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/");
        assert_eq!(
            url.join("products").unwrap().as_str(),
            "http://localhost:3000/api/products"
        );
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = parse_url("TEST", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TEST"));
    }

    #[test]
    fn test_device_url() {
        let url = device_url("192.168.1.100".parse().unwrap(), 3000).unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.100:3000/api/");

        let v6 = device_url("::1".parse().unwrap(), 8080).unwrap();
        assert_eq!(v6.as_str(), "http://[::1]:8080/api/");
    }

    #[test]
    fn test_with_base_url_defaults() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:4000/api").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.order_page_size, 10);
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:4000/api/");
    }
}
