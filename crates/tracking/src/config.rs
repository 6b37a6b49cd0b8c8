//! Configuration for the tracking engine
//!
//! Covers three concerns:
//! 1. Persisted dashboard settings (cluster, refresh interval, heatmap toggle)
//! 2. Runtime engine options derived from settings
//! 3. Auth parameters, loaded from a query string or environment variables
//!    with a compile-time fallback key

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::classify::Thresholds;

/// Settings filename in the Fleetwatch config directory
const SETTINGS_FILE: &str = "settings.json";

/// Key used when nothing is embedded at build time
const PLACEHOLDER_FALLBACK_KEY: &str = "fleetwatch-demo-key";

/// Backend cluster the dashboard talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    #[default]
    Eu,
    Us,
}

impl Cluster {
    /// Base URL of the cluster's v2 API
    pub fn base_url(&self) -> &'static str {
        match self {
            Cluster::Eu => "https://api.eu.navixy.com/v2",
            Cluster::Us => "https://api.us.navixy.com/v2",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cluster::Eu => "eu",
            Cluster::Us => "us",
        })
    }
}

impl FromStr for Cluster {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eu" => Ok(Cluster::Eu),
            "us" => Ok(Cluster::Us),
            other => anyhow::bail!("Unknown cluster '{}', expected 'eu' or 'us'", other),
        }
    }
}

/// Dashboard settings persisted across sessions
///
/// These are the only persisted fields; tracker data is never written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cluster: Cluster,
    /// Refresh interval in milliseconds
    pub refresh_ms: u64,
    /// Heatmap overlay toggle, owned by the map view
    pub show_heatmap: bool,
}

impl Settings {
    pub const DEFAULT_REFRESH_MS: u64 = 180_000;
    pub const MIN_REFRESH_MS: u64 = 1_000;

    /// Load settings from the Fleetwatch config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        config::load_json_or_default(SETTINGS_FILE)
    }

    /// Save settings to the Fleetwatch config directory
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self).context("Failed to save settings")
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        config::load_json_file(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json_file(path, self)
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Refresh interval, clamped to a one second minimum
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(Self::MIN_REFRESH_MS))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            refresh_ms: Self::DEFAULT_REFRESH_MS,
            show_heatmap: false,
        }
    }
}

/// Runtime options for the request client and scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub cluster: Cluster,
    pub refresh_interval: Duration,
    /// Budget for one API call, including the header-auth retry
    pub request_timeout: Duration,
    pub thresholds: Thresholds,
}

impl EngineOptions {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            cluster: settings.cluster,
            refresh_interval: settings.refresh_interval(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            thresholds: Thresholds::default(),
        }
    }
}

/// Raw authentication inputs, before resolution into [`crate::Credentials`]
#[derive(Clone, PartialEq, Eq)]
pub struct AuthParams {
    pub session_token: Option<String>,
    pub hash_token: Option<String>,
    /// Always present so credential resolution never fails
    pub fallback_key: String,
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthParams")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("hash_token", &self.hash_token.as_ref().map(|_| "<redacted>"))
            .field("fallback_key", &"<redacted>")
            .finish()
    }
}

impl AuthParams {
    /// Params with only the compiled-in fallback key
    pub fn fallback_only() -> Self {
        Self {
            session_token: None,
            hash_token: None,
            fallback_key: Self::compiled_fallback_key(),
        }
    }

    /// Fallback key embedded at compile time.
    /// Build with: FLEETWATCH_FALLBACK_KEY=xxx cargo build --release
    pub fn compiled_fallback_key() -> String {
        option_env!("FLEETWATCH_FALLBACK_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or(PLACEHOLDER_FALLBACK_KEY)
            .to_string()
    }

    /// Parse auth params from a URL query string
    ///
    /// `session_key` takes priority over its `sid` alias; `hash` supplies the
    /// hash token. A leading `?` is ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut session_key = None;
        let mut sid = None;
        let mut hash = None;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = non_empty(value.into_owned());
            match key.as_ref() {
                "session_key" if session_key.is_none() => session_key = value,
                "sid" if sid.is_none() => sid = value,
                "hash" if hash.is_none() => hash = value,
                _ => {}
            }
        }

        Self {
            session_token: session_key.or(sid),
            hash_token: hash,
            ..Self::fallback_only()
        }
    }

    /// Load auth params from environment variables
    ///
    /// Reads `FLEETWATCH_SESSION_KEY` and `FLEETWATCH_HASH`, plus
    /// `FLEETWATCH_QUERY` as a query string for the hosting-page style.
    /// Explicit variables win over the query string.
    pub fn from_env() -> Self {
        let from_query = std::env::var("FLEETWATCH_QUERY")
            .map(|q| Self::from_query(&q))
            .unwrap_or_else(|_| Self::fallback_only());

        Self {
            session_token: env_non_empty("FLEETWATCH_SESSION_KEY").or(from_query.session_token),
            hash_token: env_non_empty("FLEETWATCH_HASH").or(from_query.hash_token),
            fallback_key: from_query.fallback_key,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(non_empty)
}
