use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::content::DEFAULT_MAX_TEXT_CHARS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Cap on `getPageContent` text, in characters
    pub max_text_chars: usize,
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("TASKER_CONTENT_HOST").unwrap_or(defaults.host),
            port: env_or("TASKER_CONTENT_PORT", defaults.port),
            max_text_chars: env_or("TASKER_MAX_TEXT_CHARS", defaults.max_text_chars),
            fetch_timeout_secs: env_or("TASKER_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8766,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            fetch_timeout_secs: 20,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
