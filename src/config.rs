// src/config.rs
// =============================================================================
// Probe configuration: timeouts, redirect limit, retry policy, concurrency.
//
// Every knob the prober uses lives in CheckerConfig so nothing is hidden in
// client-builder calls. It can be built in code (Default + field updates),
// or loaded from a TOML file where any missing field keeps its default.
// =============================================================================

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Backoff never grows past this, however many retries are configured.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Which HTTP method a probe starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    /// HEAD first, falling back to GET when HEAD is inconclusive.
    #[default]
    Head,
    /// GET only.
    Get,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Timeout for the lightweight (HEAD) request, in seconds.
    pub head_timeout_secs: f64,
    /// Timeout for the full (GET) request and for a whole FTP session.
    pub full_timeout_secs: f64,
    /// TCP/TLS connect timeout.
    pub connect_timeout_secs: f64,
    /// Redirect hops followed before the chain counts as dead.
    pub max_redirects: usize,
    /// How many times a 5xx answer is retried before the final verdict.
    pub server_error_retries: u32,
    /// Delay before the first retry; doubled for each further one.
    pub retry_backoff_ms: u64,
    /// Maximum number of probes in flight during a batch.
    pub max_concurrency: usize,
    pub user_agent: String,
    /// Retry once without certificate verification when TLS fails.
    pub tls_fallback: bool,
    /// Treat "deep link redirected to the site's front page" as dead.
    pub flag_redirect_to_root: bool,
    pub method: ProbeMethod,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            head_timeout_secs: 30.0,
            full_timeout_secs: 60.0,
            connect_timeout_secs: 10.0,
            max_redirects: 30,
            server_error_retries: 1,
            retry_backoff_ms: 500,
            max_concurrency: 30,
            user_agent: format!(
                "Mozilla/5.0 (compatible; deadlink-checker/{})",
                env!("CARGO_PKG_VERSION")
            ),
            tls_fallback: true,
            flag_redirect_to_root: true,
            method: ProbeMethod::Head,
        }
    }
}

impl CheckerConfig {
    /// Load settings from a TOML file and validate them.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        let config: CheckerConfig = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_secs("head_timeout_secs", self.head_timeout_secs)?;
        check_secs("full_timeout_secs", self.full_timeout_secs)?;
        check_secs("connect_timeout_secs", self.connect_timeout_secs)?;

        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_redirects == 0 {
            return Err(ConfigError::Invalid {
                field: "max_redirects",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn head_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.head_timeout_secs)
    }

    pub fn full_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.full_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self.retry_backoff_ms.saturating_mul(factor);
        Duration::from_millis(millis).min(MAX_BACKOFF)
    }
}

fn check_secs(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number of seconds, got {value}"),
        })
    }
}
