//! Process configuration.
//!
//! Loaded once at startup in priority order:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (`hookrelay.toml`, optional)
//! 3. Built-in defaults (lowest priority)
//!
//! Environment variable names are the upper-cased field names. The legacy
//! names `RLOG_LOG_LEVEL` and `RLOG_TRACE_LEVEL` are still read; when both a
//! legacy and a current name are set, the current name wins.

use std::{net::SocketAddr, path::Path, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use bridge::{DownstreamEndpoint, RedactionPolicy, RelaySettings};
use downstream::ClientConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use listener::ServeSettings;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "hookrelay.toml";

const ENV_KEYS: &[&str] = &[
    "teams_hostname",
    "http_scheme",
    "tls_insecure_skip_verify",
    "log_level",
    "trace_level",
    "listen_addr",
    "health_listen_addr",
    "downstream_timeout_seconds",
    "request_timeout_seconds",
    "log_json",
    "otlp_endpoint",
];

const LEGACY_ENV_PREFIX: &str = "rlog_";
const LEGACY_ENV_KEYS: &[&str] = &["rlog_log_level", "rlog_trace_level"];

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Downstream incoming-webhook host, `host` or `host:port`. Required.
    ///
    /// Environment variable: `TEAMS_HOSTNAME`
    pub teams_hostname: String,
    /// Downstream URL scheme, `http` or `https`.
    ///
    /// Environment variable: `HTTP_SCHEME`
    pub http_scheme: String,
    /// Skip downstream TLS certificate verification.
    ///
    /// Environment variable: `TLS_INSECURE_SKIP_VERIFY`
    pub tls_insecure_skip_verify: bool,
    /// Log verbosity: `off`, `error`, `warn`, `info`, `debug`, `trace`.
    /// `critical` and `none` are accepted as `error` and `off`.
    ///
    /// Environment variable: `LOG_LEVEL` (legacy: `RLOG_LOG_LEVEL`)
    pub log_level: String,
    /// Trace threshold. Any value `>= 0` enables trace output.
    ///
    /// Environment variable: `TRACE_LEVEL` (legacy: `RLOG_TRACE_LEVEL`)
    pub trace_level: i64,
    /// Relay surface bind address.
    ///
    /// Environment variable: `LISTEN_ADDR`
    pub listen_addr: SocketAddr,
    /// Liveness surface bind address.
    ///
    /// Environment variable: `HEALTH_LISTEN_ADDR`
    pub health_listen_addr: SocketAddr,
    /// Timeout for the downstream call, in seconds.
    ///
    /// Environment variable: `DOWNSTREAM_TIMEOUT_SECONDS`
    pub downstream_timeout_seconds: u64,
    /// Timeout for handling one inbound request, in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_SECONDS`
    pub request_timeout_seconds: u64,
    /// Emit JSON log lines instead of human-readable ones.
    ///
    /// Environment variable: `LOG_JSON`
    pub log_json: bool,
    /// OTLP gRPC endpoint for span export. Export is off when unset.
    ///
    /// Environment variable: `OTLP_ENDPOINT`
    pub otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            teams_hostname: String::new(),
            http_scheme: "https".to_string(),
            tls_insecure_skip_verify: false,
            log_level: "info".to_string(),
            trace_level: -1,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            health_listen_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            downstream_timeout_seconds: 10,
            request_timeout_seconds: 30,
            log_json: true,
            otlp_endpoint: None,
        }
    }
}

impl Config {
    /// Loads configuration from defaults, the TOML file at `path`, and the
    /// environment. A missing file is not an error.
    ///
    /// The result is not validated; call [`Config::validate`] before serving.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("Failed to load configuration")
    }

    fn figment(path: &Path) -> Figment {
        let legacy = Env::raw().only(LEGACY_ENV_KEYS).map(|key| {
            key.as_str()
                .to_ascii_lowercase()
                .trim_start_matches(LEGACY_ENV_PREFIX)
                .to_string()
                .into()
        });

        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(legacy)
            .merge(Env::raw().only(ENV_KEYS))
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let host = self.teams_hostname.trim();
        if host.is_empty() {
            bail!("TEAMS_HOSTNAME must be set");
        }
        if host.contains('/') {
            bail!("TEAMS_HOSTNAME must be a host name (optionally with port), got `{host}`");
        }

        if !matches!(self.http_scheme.as_str(), "http" | "https") {
            bail!(
                "HTTP_SCHEME must be `http` or `https`, got `{}`",
                self.http_scheme
            );
        }

        self.log_filter()?;

        if self.downstream_timeout_seconds == 0 {
            bail!("DOWNSTREAM_TIMEOUT_SECONDS must be greater than 0");
        }

        if self.request_timeout_seconds == 0 {
            bail!("REQUEST_TIMEOUT_SECONDS must be greater than 0");
        }

        Ok(())
    }

    /// Effective log filter: the configured level, or `TRACE` when the trace
    /// threshold is enabled.
    pub fn log_filter(&self) -> Result<LevelFilter> {
        let level = parse_level(&self.log_level)?;
        if self.trace_level >= 0 {
            Ok(LevelFilter::TRACE)
        } else {
            Ok(level)
        }
    }

    /// Whether credentials may appear in cleartext in the logs.
    pub fn redaction_policy(&self) -> Result<RedactionPolicy> {
        Ok(RedactionPolicy::from_verbosity(
            parse_level(&self.log_level)?,
            self.trace_level,
        ))
    }

    /// Convert to the relay's settings.
    pub fn to_relay_settings(&self) -> Result<RelaySettings> {
        Ok(RelaySettings {
            endpoint: DownstreamEndpoint::new(&self.http_scheme, self.teams_hostname.trim()),
            redaction: self.redaction_policy()?,
        })
    }

    /// Convert to the downstream client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.downstream_timeout_seconds),
            verify_tls: !self.tls_insecure_skip_verify,
            ..ClientConfig::default()
        }
    }

    /// Convert to the listener settings.
    pub fn to_serve_settings(&self) -> ServeSettings {
        ServeSettings {
            listen_addr: self.listen_addr,
            health_listen_addr: self.health_listen_addr,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}

/// Parses a log level name, case-insensitively.
pub fn parse_level(value: &str) -> Result<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "critical" => Ok(LevelFilter::ERROR),
        "none" => Ok(LevelFilter::OFF),
        other => LevelFilter::from_str(other)
            .map_err(|_| anyhow!("LOG_LEVEL `{value}` is not a valid log level")),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
