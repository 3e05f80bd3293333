//! Configuration management for the lazyload engine.
//!
//! Provides hierarchical configuration loading with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`LAZYLOAD__` prefix)
//!
//! Option values are never rejected. [`LazyloadConfig::normalize`] replaces
//! anything unusable with its default and logs a warning; only unreadable or
//! malformed configuration sources produce an error.
mod margin;
pub use margin::*;

use std::env;
use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::RateLimitPolicy;
use crate::Result;

pub const DEFAULT_ATTRIBUTE: &str = "data-lazyload";
pub const DEFAULT_DURATION_MS: u64 = 300;

/// Engine options.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LazyloadConfig {
    /// Selector of the observation root. The first match is used; no match
    /// (or no selector) means the whole document.
    #[serde(default)]
    pub container: Option<String>,

    /// Marker attribute holding the pending resource URL
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Pre-load distance around the observation root
    #[serde(default)]
    pub margin: MarginConfig,

    /// Destroy the engine once an evaluation pass leaves nothing to watch
    #[serde(default = "default_auto_destroy")]
    pub auto_destroy: bool,

    /// Rate limiter interval in milliseconds. Must be positive.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    #[serde(default)]
    pub rate_limit: RateLimitPolicy,
}

fn default_attribute() -> String {
    DEFAULT_ATTRIBUTE.to_string()
}
fn default_auto_destroy() -> bool {
    true
}
fn default_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}

impl Default for LazyloadConfig {
    fn default() -> Self {
        Self {
            container: None,
            attribute: default_attribute(),
            margin: MarginConfig::default(),
            auto_destroy: default_auto_destroy(),
            duration_ms: default_duration_ms(),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl LazyloadConfig {
    /// Loads configuration from hierarchical sources without normalizing.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `LAZYLOAD__` prefix (highest priority)
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("LAZYLOAD__MARGIN__BOTTOM", "500");
    /// let cfg = LazyloadConfig::new()?.normalize();
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("LAZYLOAD")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from file, then the latest environment
    /// variables, on top of the current values.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("LAZYLOAD")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Preset matching a long-lived shared engine: never self-destroys.
    pub fn persistent() -> Self {
        Self {
            auto_destroy: false,
            ..Default::default()
        }
    }

    /// Replace unusable values with their defaults.
    pub fn normalize(mut self) -> Self {
        if self.attribute.trim().is_empty() {
            warn!("empty marker attribute, using {DEFAULT_ATTRIBUTE}");
            self.attribute = default_attribute();
        }

        if self.duration_ms == 0 {
            warn!("duration_ms must be positive, using {DEFAULT_DURATION_MS}");
            self.duration_ms = DEFAULT_DURATION_MS;
        }

        if matches!(&self.container, Some(selector) if selector.trim().is_empty()) {
            self.container = None;
        }

        self.margin = self.margin.normalize();
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
