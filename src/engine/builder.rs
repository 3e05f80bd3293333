//! Fluent construction of a [`Lazyload`] engine.
//!
//! ## Example
//! ```ignore
//! let engine = LazyloadBuilder::<HostTypeConfig>::new(document, geometry, signals)
//!     .config(LazyloadConfig::new()?)
//!     .on_start(|event| event.src = event.src.take().map(|src| cdn(&src)))
//!     .build();
//! ```
//!
//! `build()` scans the observation root, runs the initial evaluation pass
//! and subscribes to host signals before returning. With `auto_destroy` set
//! and nothing left to watch after that pass, the returned engine is already
//! destroyed.

use std::sync::Arc;

use tracing::warn;

use crate::alias::DOF;
use crate::alias::EOF;
use crate::alias::GOF;
use crate::alias::SOF;
use crate::Document;
use crate::FaultReporter;
use crate::LazyloadConfig;
use crate::Lazyload;
use crate::LoadEvent;
use crate::TracingFaultReporter;
use crate::TypeConfig;

/// Legacy single-callback interceptor, run by the built-in start listener.
pub type OnStartFn<E> = Arc<dyn Fn(&mut LoadEvent<E>) + Send + Sync>;

pub struct LazyloadBuilder<T: TypeConfig> {
    pub(super) config: LazyloadConfig,
    pub(super) document: Arc<DOF<T>>,
    pub(super) geometry: Arc<GOF<T>>,
    pub(super) signals: Arc<SOF<T>>,
    pub(super) container: Option<EOF<T>>,
    pub(super) on_start: Option<OnStartFn<EOF<T>>>,
    pub(super) fault_reporter: Arc<dyn FaultReporter>,
}

impl<T: TypeConfig> LazyloadBuilder<T> {
    /// Starts from [`LazyloadConfig::default`] and the tracing fault reporter.
    pub fn new(
        document: Arc<DOF<T>>,
        geometry: Arc<GOF<T>>,
        signals: Arc<SOF<T>>,
    ) -> Self {
        Self {
            config: LazyloadConfig::default(),
            document,
            geometry,
            signals,
            container: None,
            on_start: None,
            fault_reporter: Arc::new(TracingFaultReporter),
        }
    }

    pub fn config(
        mut self,
        config: LazyloadConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Observation root given as an element. Takes precedence over
    /// `LazyloadConfig::container`.
    pub fn container(
        mut self,
        container: EOF<T>,
    ) -> Self {
        self.container = Some(container);
        self
    }

    pub fn on_start<F>(
        mut self,
        on_start: F,
    ) -> Self
    where
        F: Fn(&mut LoadEvent<EOF<T>>) + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(on_start));
        self
    }

    pub fn fault_reporter(
        mut self,
        fault_reporter: Arc<dyn FaultReporter>,
    ) -> Self {
        self.fault_reporter = fault_reporter;
        self
    }

    pub fn build(self) -> Lazyload<T> {
        Lazyload::start(self)
    }

    /// Element container if it passes the capability check, else the first
    /// match of the configured selector.
    pub(super) fn resolve_container(&self) -> Option<EOF<T>> {
        if let Some(container) = &self.container {
            if self.document.is_element(container) {
                return Some(container.clone());
            }
            warn!("container is not an element, observing the whole document");
            return None;
        }

        let selector = self.config.container.as_deref()?;
        let found = self.document.query_selector_all(selector).into_iter().next();
        if found.is_none() {
            warn!(selector, "container selector matched nothing, observing the whole document");
        }
        found
    }
}
