//! Configuration for spoolfleet tools.
//!
//! TOML file + `SPOOLFLEET_`-prefixed environment variables, API key
//! resolution (env var indirection or plaintext), and translation to
//! `spoolfleet_core::HubConfig`.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spoolfleet_core::{Capabilities, HubConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured: set backend.api_key, backend.api_key_env, or SPOOLFLEET_API_KEY")]
    NoApiKey,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration for the spoolfleet CLI.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Backend connection settings.
    #[serde(default)]
    pub backend: Backend,

    /// Fleet engine tuning.
    #[serde(default)]
    pub fleet: Fleet,

    /// Spool inventory defaults.
    #[serde(default)]
    pub spool: SpoolDefaults,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Backend connection settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct Backend {
    /// Backend base URL (e.g., "http://fleet.local:8000").
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// API key (plaintext — prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Capabilities granted to this API key. Unset means all.
    pub capabilities: Option<Vec<String>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: None,
            api_key_env: None,
            timeout_secs: default_timeout(),
            capabilities: None,
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout() -> u64 {
    30
}

/// Fleet engine tuning.
#[derive(Debug, Deserialize, Serialize)]
pub struct Fleet {
    /// How often to poll printer/spool/queue state (seconds). 0 = never.
    #[serde(default = "default_status_poll")]
    pub status_poll_secs: u64,

    /// A device with no events for this long is considered offline.
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,

    /// Enable the device event WebSocket.
    #[serde(default = "default_events_enabled")]
    pub events_enabled: bool,

    /// Explicit event stream URL. Derived from `backend.url` when unset.
    pub events_url: Option<String>,
}

impl Default for Fleet {
    fn default() -> Self {
        Self {
            status_poll_secs: default_status_poll(),
            heartbeat_timeout_secs: default_heartbeat_timeout(),
            events_enabled: default_events_enabled(),
            events_url: None,
        }
    }
}

fn default_status_poll() -> u64 {
    15
}
fn default_heartbeat_timeout() -> u64 {
    30
}
fn default_events_enabled() -> bool {
    true
}

/// Spool inventory defaults.
#[derive(Debug, Deserialize, Serialize)]
pub struct SpoolDefaults {
    /// Empty-spool weight assumed for records without one (grams).
    #[serde(default = "default_core_weight")]
    pub default_core_weight_g: f64,
}

impl Default for SpoolDefaults {
    fn default() -> Self {
        Self {
            default_core_weight_g: default_core_weight(),
        }
    }
}

fn default_core_weight() -> f64 {
    250.0
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "spoolfleet", "spoolfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("spoolfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full `Config` from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full `Config` from an explicit file path + environment.
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SPOOLFLEET_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
#[must_use]
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── API key resolution ──────────────────────────────────────────────

/// Resolve the API key from the credential chain.
///
/// Order: `SPOOLFLEET_API_KEY`, then the env var named by
/// `backend.api_key_env`, then the plaintext `backend.api_key`.
pub fn resolve_api_key(backend: &Backend) -> Result<SecretString, ConfigError> {
    if let Ok(val) = std::env::var("SPOOLFLEET_API_KEY") {
        if !val.is_empty() {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref env_name) = backend.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref key) = backend.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoApiKey)
}

// ── Translation to HubConfig ────────────────────────────────────────

/// Build a `HubConfig` from the loaded configuration.
pub fn hub_config(cfg: &Config) -> Result<HubConfig, ConfigError> {
    let backend_url: url::Url =
        cfg.backend.url.parse().map_err(|_| ConfigError::Validation {
            field: "backend.url".into(),
            reason: format!("invalid URL: {}", cfg.backend.url),
        })?;

    let api_key = resolve_api_key(&cfg.backend)?;

    let events_url = cfg
        .fleet
        .events_url
        .as_deref()
        .map(|raw| {
            raw.parse().map_err(|_| ConfigError::Validation {
                field: "fleet.events_url".into(),
                reason: format!("invalid URL: {raw}"),
            })
        })
        .transpose()?;

    if cfg.spool.default_core_weight_g < 0.0 {
        return Err(ConfigError::Validation {
            field: "spool.default_core_weight_g".into(),
            reason: "must not be negative".into(),
        });
    }

    let mut hub = HubConfig::new(backend_url, api_key);
    hub.events_url = events_url;
    hub.events_enabled = cfg.fleet.events_enabled;
    hub.timeout = Duration::from_secs(cfg.backend.timeout_secs);
    hub.status_poll_secs = cfg.fleet.status_poll_secs;
    hub.heartbeat_timeout_secs = cfg.fleet.heartbeat_timeout_secs;
    hub.default_core_weight_g = cfg.spool.default_core_weight_g;
    if let Some(ref caps) = cfg.backend.capabilities {
        hub.capabilities = Capabilities::new(caps.iter().cloned());
    }
    Ok(hub)
}
