use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use mediagen_pipeline::{ProviderSettings, VideoBackend};
use mediagen_providers::http::DEFAULT_REQUEST_TIMEOUT;
use mediagen_providers::lifecycle::DEFAULT_POLL_INTERVAL;
use mediagen_providers::PollPolicy;

/// Errors raised while reading configuration. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be parsed.
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Enumerated settings
// ---------------------------------------------------------------------------

/// Which coordination network the worker reports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinationEnv {
    #[default]
    Local,
    Staging,
    Production,
}

impl CoordinationEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordinationEnv::Local => "local",
            CoordinationEnv::Staging => "staging",
            CoordinationEnv::Production => "production",
        }
    }
}

impl fmt::Display for CoordinationEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordinationEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" => Ok(CoordinationEnv::Local),
            "staging" => Ok(CoordinationEnv::Staging),
            "production" | "prod" => Ok(CoordinationEnv::Production),
            other => Err(format!("expected local, staging or production, got '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected text or json, got '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig
// ---------------------------------------------------------------------------

/// Worker configuration loaded from environment variables.
///
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Route every request to the test double instead of live providers.
    pub dummy_mode: bool,
    pub coordination_env: CoordinationEnv,
    /// Seed for the usage-record identity; `None` uses the process identity.
    pub worker_name: Option<String>,
    pub providers: ProviderSettings,
    /// Collector for usage records; `None` logs them through `tracing`.
    pub usage_log_url: Option<String>,
    pub usage_log_key: Option<String>,
    pub log_format: LogFormat,
    /// Read JSON-lines steps from stdin and publish them as pending.
    pub feed_stdin: bool,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default      |
    /// |----------------------|--------------|
    /// | `DUMMY_MODE`         | `false`      |
    /// | `COORDINATION_ENV`   | `local`      |
    /// | `WORKER_NAME`        | unset        |
    /// | `VIDEO_PROVIDER`     | `kling`      |
    /// | `FAL_API_KEY`        | required*    |
    /// | `PIAPI_API_KEY`      | required*    |
    /// | `RUNWAY_API_KEY`     | required*    |
    /// | `FAL_BASE_URL`       | provider URL |
    /// | `PIAPI_BASE_URL`     | provider URL |
    /// | `RUNWAY_BASE_URL`    | provider URL |
    /// | `POLL_INTERVAL_SECS` | `5`          |
    /// | `POLL_MAX_WAIT_SECS` | unset        |
    /// | `HTTP_TIMEOUT_SECS`  | `60`         |
    /// | `USAGE_LOG_URL`      | unset        |
    /// | `USAGE_LOG_KEY`      | unset        |
    /// | `LOG_FORMAT`         | `text`       |
    /// | `STEP_FEED_STDIN`    | `false`      |
    ///
    /// \* Outside dummy mode, `FAL_API_KEY` is always required and the
    /// video key is required for the selected `VIDEO_PROVIDER` only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dummy_mode = match get("DUMMY_MODE") {
            Some(value) => parse_bool("DUMMY_MODE", &value)?,
            None => false,
        };
        let feed_stdin = match get("STEP_FEED_STDIN") {
            Some(value) => parse_bool("STEP_FEED_STDIN", &value)?,
            None => false,
        };
        let coordination_env = parse_or_default("COORDINATION_ENV", get("COORDINATION_ENV"))?;
        let video_backend: VideoBackend = parse_or_default("VIDEO_PROVIDER", get("VIDEO_PROVIDER"))?;
        let log_format = parse_or_default("LOG_FORMAT", get("LOG_FORMAT"))?;

        let interval = match get("POLL_INTERVAL_SECS") {
            Some(value) => Duration::from_secs(parse_secs("POLL_INTERVAL_SECS", &value)?),
            None => DEFAULT_POLL_INTERVAL,
        };
        let mut poll = PollPolicy::every(interval);
        if let Some(value) = get("POLL_MAX_WAIT_SECS") {
            poll = poll.with_max_wait(Duration::from_secs(parse_secs("POLL_MAX_WAIT_SECS", &value)?));
        }
        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_secs("HTTP_TIMEOUT_SECS", &value)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let providers = ProviderSettings {
            fal_api_key: get("FAL_API_KEY"),
            piapi_api_key: get("PIAPI_API_KEY"),
            runway_api_key: get("RUNWAY_API_KEY"),
            fal_base_url: get("FAL_BASE_URL"),
            piapi_base_url: get("PIAPI_BASE_URL"),
            runway_base_url: get("RUNWAY_BASE_URL"),
            video_backend,
            poll,
            http_timeout,
        };

        if !dummy_mode {
            if providers.fal_api_key.is_none() {
                return Err(ConfigError::Missing("FAL_API_KEY"));
            }
            match video_backend {
                VideoBackend::Kling if providers.piapi_api_key.is_none() => {
                    return Err(ConfigError::Missing("PIAPI_API_KEY"));
                }
                VideoBackend::Runway if providers.runway_api_key.is_none() => {
                    return Err(ConfigError::Missing("RUNWAY_API_KEY"));
                }
                _ => {}
            }
        }

        Ok(Self {
            dummy_mode,
            coordination_env,
            worker_name: get("WORKER_NAME"),
            providers,
            usage_log_url: get("USAGE_LOG_URL"),
            usage_log_key: get("USAGE_LOG_KEY"),
            log_format,
            feed_stdin,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or_default<T>(var: &'static str, value: Option<String>) -> Result<T, ConfigError>
where
    T: FromStr<Err = String> + Default,
{
    match value {
        Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
            var,
            value,
            reason,
        }),
        None => Ok(T::default()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
