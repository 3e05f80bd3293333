use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Margin;

pub const DEFAULT_MARGIN: f64 = 100.0;

/// Margin as written in configuration.
///
/// ```toml
/// [margin]
/// all = 100      # applies to every edge not set below
/// bottom = 500
/// ```
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MarginConfig {
    #[serde(default = "default_margin")]
    pub all: f64,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub right: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub left: Option<f64>,
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

impl From<f64> for MarginConfig {
    fn from(value: f64) -> Self {
        Self::uniform(value)
    }
}

impl From<Margin> for MarginConfig {
    fn from(margin: Margin) -> Self {
        Self {
            all: DEFAULT_MARGIN,
            top: Some(margin.top),
            right: Some(margin.right),
            bottom: Some(margin.bottom),
            left: Some(margin.left),
        }
    }
}

impl MarginConfig {
    pub fn uniform(value: f64) -> Self {
        Self {
            all: value,
            top: None,
            right: None,
            bottom: None,
            left: None,
        }
    }

    /// Drop non-finite values: the scalar falls back to the default, an edge
    /// falls back to the scalar.
    pub fn normalize(self) -> Self {
        let all = if self.all.is_finite() {
            self.all
        } else {
            warn!("margin {} is not finite, using {DEFAULT_MARGIN}", self.all);
            DEFAULT_MARGIN
        };
        let edge = |name: &str, value: Option<f64>| match value {
            Some(v) if !v.is_finite() => {
                warn!("{name} margin {v} is not finite, using {all}");
                None
            }
            other => other,
        };

        Self {
            all,
            top: edge("top", self.top),
            right: edge("right", self.right),
            bottom: edge("bottom", self.bottom),
            left: edge("left", self.left),
        }
    }

    /// Resolve into four concrete edges.
    pub fn resolve(&self) -> Margin {
        let normalized = self.normalize();
        let all = normalized.all;
        Margin {
            top: normalized.top.unwrap_or(all),
            right: normalized.right.unwrap_or(all),
            bottom: normalized.bottom.unwrap_or(all),
            left: normalized.left.unwrap_or(all),
        }
    }
}
