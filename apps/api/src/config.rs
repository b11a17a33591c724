use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// When set, persisted state lives in Redis instead of `state_dir`.
    pub redis_url: Option<String>,
    pub state_dir: PathBuf,
    pub llm_max_attempts: u32,
    pub llm_retry_base_ms: u64,
    pub llm_retry_max_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            state_dir: std::env::var("STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 3)?,
            llm_retry_base_ms: parse_env("LLM_RETRY_BASE_MS", 1000)?,
            llm_retry_max_ms: parse_env("LLM_RETRY_MAX_MS", 8000)?,
        })
    }

    /// Retry policy applied around every LLM-backed collaborator call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.llm_max_attempts.max(1),
            base_delay: Duration::from_millis(self.llm_retry_base_ms),
            max_delay: Duration::from_millis(self.llm_retry_max_ms),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            anthropic_api_key: "key".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            redis_url: None,
            state_dir: PathBuf::from("./data"),
            llm_max_attempts: 0,
            llm_retry_base_ms: 250,
            llm_retry_max_ms: 2000,
        }
    }

    #[test]
    fn test_retry_policy_never_drops_below_one_attempt() {
        let policy = sample().retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("ASSESSOR_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
