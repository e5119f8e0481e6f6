use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub backend_url: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub request_timeout: Duration,
    pub online_threshold: Duration,
    pub map_poll_interval: Duration,
    pub session_idle_ttl: Duration,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") | None => LogFormat::Compact,
            Some(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: expected compact or json, got {other}"
                )));
            }
        };

        let backend_url =
            lookup("BACKEND_URL").unwrap_or_else(|| "http://localhost:5000/api".to_string());
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(AppError::Internal(format!(
                "invalid BACKEND_URL: {backend_url} is not an http(s) url"
            )));
        }

        let secs = |key: &str, default: u64| -> Result<Duration, AppError> {
            Ok(Duration::from_secs(
                parse_or_default(lookup(key), key, default)?.max(1),
            ))
        };

        Ok(Self {
            http_port: parse_or_default(lookup("HTTP_PORT"), "HTTP_PORT", 3000)?,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", 15)?,
            online_threshold: secs("ONLINE_THRESHOLD_SECS", 300)?,
            map_poll_interval: secs("MAP_POLL_INTERVAL_SECS", 10)?,
            session_idle_ttl: secs("SESSION_IDLE_TTL_SECS", 3600)?,
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        })
    }

    /// Defaults for everything except the backend location.
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        let backend_url: String = backend_url.into();
        Self {
            http_port: 3000,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            request_timeout: Duration::from_secs(15),
            online_threshold: Duration::from_secs(300),
            map_poll_interval: Duration::from_secs(10),
            session_idle_ttl: Duration::from_secs(3600),
            static_dir: "static".to_string(),
        }
    }
}

fn parse_or_default<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}
