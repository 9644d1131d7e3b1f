//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_QUEUE_MIN_DELAY_MS: u64 = 500;
pub const DEFAULT_QUEUE_RECOVERY_SECS: u64 = 30;
pub const DEFAULT_QUEUE_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_POLL_CONVERSATIONS_SECS: u64 = 10;
pub const DEFAULT_POLL_MESSAGES_SECS: u64 = 3;

const SESSION_DIR: &str = ".solidify";
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Pacing knobs for the admin request queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Minimum gap between two dispatches.
    pub min_delay: Duration,
    /// After a 429, no dispatch happens until this much time has passed.
    pub recovery_window: Duration,
    /// After a 429, `min_delay` is doubled for this long.
    pub backoff_period: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_QUEUE_MIN_DELAY_MS),
            recovery_window: Duration::from_secs(DEFAULT_QUEUE_RECOVERY_SECS),
            backoff_period: Duration::from_secs(DEFAULT_QUEUE_BACKOFF_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub conversations: Duration,
    pub messages: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            conversations: Duration::from_secs(DEFAULT_POLL_CONVERSATIONS_SECS),
            messages: Duration::from_secs(DEFAULT_POLL_MESSAGES_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub queue: QueueConfig,
    pub polling: PollingConfig,
    /// `None` when no home directory could be resolved and no override was set.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            timeouts: Timeouts::default(),
            queue: QueueConfig::default(),
            polling: PollingConfig::default(),
            session_file: default_session_file(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// All optional:
    /// - `SOLIDIFY_API_URL`: default `http://localhost:5000/api`
    /// - `SOLIDIFY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SOLIDIFY_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SOLIDIFY_QUEUE_MIN_DELAY_MS`: default 500
    /// - `SOLIDIFY_QUEUE_RECOVERY_SECS`: default 30
    /// - `SOLIDIFY_QUEUE_BACKOFF_SECS`: default 60
    /// - `SOLIDIFY_POLL_CONVERSATIONS_SECS`: default 10
    /// - `SOLIDIFY_POLL_MESSAGES_SECS`: default 3
    /// - `SOLIDIFY_SESSION_FILE`: default `~/.solidify/session.json`
    ///
    /// Unparseable values fall back to the default, as does `0` for the poll
    /// intervals.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("SOLIDIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let session_file = std::env::var("SOLIDIFY_SESSION_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(default_session_file);

        Self {
            base_url: normalize_base_url(&base_url),
            timeouts: Timeouts {
                request_secs: env_parse("SOLIDIFY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("SOLIDIFY_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            queue: QueueConfig {
                min_delay: Duration::from_millis(env_parse("SOLIDIFY_QUEUE_MIN_DELAY_MS", DEFAULT_QUEUE_MIN_DELAY_MS)),
                recovery_window: Duration::from_secs(env_parse(
                    "SOLIDIFY_QUEUE_RECOVERY_SECS",
                    DEFAULT_QUEUE_RECOVERY_SECS,
                )),
                backoff_period: Duration::from_secs(env_parse("SOLIDIFY_QUEUE_BACKOFF_SECS", DEFAULT_QUEUE_BACKOFF_SECS)),
            },
            polling: PollingConfig {
                conversations: Duration::from_secs(env_parse_nonzero(
                    "SOLIDIFY_POLL_CONVERSATIONS_SECS",
                    DEFAULT_POLL_CONVERSATIONS_SECS,
                )),
                messages: Duration::from_secs(env_parse_nonzero(
                    "SOLIDIFY_POLL_MESSAGES_SECS",
                    DEFAULT_POLL_MESSAGES_SECS,
                )),
            },
            session_file,
        }
    }

    /// Replace the base URL, applying the same normalization as `from_env`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn default_session_file() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(SESSION_DIR).join(SESSION_FILE_NAME))
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Like `env_parse`, but a zero value also falls back to `default`.
fn env_parse_nonzero(key: &str, default: u64) -> u64 {
    match env_parse(key, default) {
        0 => default,
        n => n,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
