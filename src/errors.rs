//! Lazyload Engine Error Hierarchy
//!
//! Public engine operations never return errors to their callers. The types
//! here cover configuration loading and the faults raised by caller-supplied
//! completion functions and interceptors, which are routed to a
//! [`FaultReporter`](crate::FaultReporter) instead of being propagated.

use config::ConfigError;

use crate::WatchKey;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration source could not be read or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A completion function failed. Completions return this for their own
    /// errors; the engine raises it when one panics.
    #[error("Completion failed: {0}")]
    Completion(String),

    /// An interceptor reported a failure before proceeding
    #[error("Interceptor failed: {0}")]
    Interceptor(String),
}

/// A failure observed while evaluating watched entries.
///
/// Faults never abort an evaluation pass. They are collected and handed to
/// the engine's fault reporter once the pass is over.
#[derive(Debug)]
pub struct Fault {
    /// Entry whose completion raised the fault, if known
    pub key: Option<WatchKey>,
    pub error: Error,
}

impl Fault {
    pub(crate) fn completion(
        key: WatchKey,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(key),
            error: Error::Completion(message.into()),
        }
    }

    pub(crate) fn from_error(
        key: WatchKey,
        error: Error,
    ) -> Self {
        Self {
            key: Some(key),
            error,
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.key {
            Some(key) => write!(f, "[entry {key}] {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Render a caught panic payload as a message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
