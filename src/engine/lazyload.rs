use std::fmt;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::trace;

use super::LazyloadBuilder;
use crate::alias::DOF;
use crate::alias::EOF;
use crate::alias::GOF;
use crate::alias::SOF;
use crate::completion_fn;
use crate::errors::panic_message;
use crate::intersects;
use crate::metrics;
use crate::same_completion;
use crate::start_listener;
use crate::CallbackRegistry;
use crate::Completion;
use crate::CompletionFn;
use crate::Document;
use crate::ElementKind;
use crate::EngineState;
use crate::Fault;
use crate::FaultReporter;
use crate::GeometryProvider;
use crate::InterceptorChain;
use crate::LazyloadConfig;
use crate::LoadEvent;
use crate::Margin;
use crate::MarginConfig;
use crate::ObservationRegion;
use crate::Proceed;
use crate::RateLimiter;
use crate::Signal;
use crate::SignalHandler;
use crate::SignalSource;
use crate::StartListener;
use crate::Target;
use crate::TypeConfig;
use crate::WatchKey;

/// Attribute compared against before an image `src` is rewritten.
const SRC_ATTRIBUTE: &str = "src";

/// Handle to a running engine. Clones share the same engine.
pub struct Lazyload<T: TypeConfig> {
    inner: Arc<EngineInner<T>>,
}

impl<T: TypeConfig> Clone for Lazyload<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: TypeConfig> fmt::Debug for Lazyload<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Lazyload")
            .field("state", &self.state())
            .field("entries", &self.len())
            .field("limiter", &self.inner.limiter)
            .finish_non_exhaustive()
    }
}

struct EngineInner<T: TypeConfig> {
    config: LazyloadConfig,
    margin: ArcSwap<Margin>,

    document: Arc<DOF<T>>,
    geometry: Arc<GOF<T>>,
    signals: Arc<SOF<T>>,
    fault_reporter: Arc<dyn FaultReporter>,
    container: Option<EOF<T>>,

    registry: Mutex<CallbackRegistry<EOF<T>>>,
    /// Entries taken out of the registry while their completion runs
    in_flight: AtomicUsize,
    interceptors: Arc<InterceptorChain<EOF<T>>>,
    state: Mutex<EngineState>,

    /// Gates the evaluation pass triggered by host signals
    limiter: RateLimiter,
    /// Subscribed to every watched signal while active
    handler: SignalHandler,
    /// Shared by every entry registered through `add_elements`
    image_completion: CompletionFn<EOF<T>>,
}

impl<T: TypeConfig> Lazyload<T> {
    pub(super) fn start(mut builder: LazyloadBuilder<T>) -> Self {
        builder.config = builder.config.normalize();
        let container = builder.resolve_container();

        let LazyloadBuilder {
            config,
            document,
            geometry,
            signals,
            on_start,
            fault_reporter,
            ..
        } = builder;

        let interceptors = Arc::new(InterceptorChain::new());
        interceptors.add_listener(start_listener(
            move |mut event: LoadEvent<EOF<T>>, proceed: Proceed<EOF<T>>| {
                if let Some(on_start) = &on_start {
                    on_start(&mut event);
                }
                proceed.proceed(event);
            },
        ));

        let image_completion = image_completion::<T>(
            document.clone(),
            interceptors.clone(),
            config.attribute.clone(),
        );
        let margin = config.margin.resolve();

        let inner = Arc::new_cyclic(|weak: &Weak<EngineInner<T>>| {
            let pass = weak.clone();
            let limiter = RateLimiter::new(config.rate_limit, config.duration(), move || {
                if let Some(inner) = pass.upgrade() {
                    inner.evaluate();
                }
            });

            let signalled = weak.clone();
            let handler: SignalHandler = Arc::new(move || {
                if let Some(inner) = signalled.upgrade() {
                    inner.on_signal();
                }
            });

            EngineInner {
                config,
                margin: ArcSwap::from_pointee(margin),
                document,
                geometry,
                signals,
                fault_reporter,
                container,
                registry: Mutex::new(CallbackRegistry::new()),
                in_flight: AtomicUsize::new(0),
                interceptors,
                state: Mutex::new(EngineState::Paused),
                limiter,
                handler,
                image_completion,
            }
        });

        let engine = Self { inner };
        info!(
            attribute = %engine.inner.config.attribute,
            container = engine.inner.container.is_some(),
            "lazyload engine starting"
        );

        let root = match &engine.inner.container {
            Some(container) => container.clone(),
            None => engine.inner.document.root(),
        };
        engine.add_elements(Target::Element(root));
        engine.inner.evaluate();
        engine.resume();
        engine
    }

    /// Register every element of `target`, and every descendant, that
    /// carries a non-empty marker attribute.
    pub fn add_elements(
        &self,
        target: impl Into<Target<EOF<T>>>,
    ) {
        let inner = &self.inner;
        if inner.is_destroyed() {
            return;
        }

        // Scan roots need not be elements themselves (the document root is
        // not); `add_callback` filters what gets registered.
        for candidate in inner.resolve_target(target.into()) {
            let mut scan = vec![candidate.clone()];
            scan.extend(inner.document.descendants(&candidate));

            for element in scan {
                if inner.is_markable(&element) {
                    self.add_callback(&element, inner.image_completion.clone());
                }
            }
        }
    }

    /// Unregister entries whose element is part of `target`. Elements are
    /// left untouched.
    pub fn remove_elements(
        &self,
        target: impl Into<Target<EOF<T>>>,
    ) {
        let targets = self.inner.resolve_target(target.into());
        let removed = self
            .inner
            .registry
            .lock()
            .remove_where(|element, _| targets.contains(element));
        trace!(removed, "elements unregistered");
    }

    /// Watch `element` and run `completion` once it intersects the
    /// observation region. The entry is evaluated immediately.
    ///
    /// Returns `None` without registering when `element` fails the host's
    /// capability check or the engine is destroyed.
    pub fn add_callback(
        &self,
        element: &EOF<T>,
        completion: CompletionFn<EOF<T>>,
    ) -> Option<WatchKey> {
        let inner = &self.inner;
        if !inner.document.is_element(element) {
            trace!(?element, "not an element, skipped");
            return None;
        }
        if inner.is_destroyed() {
            return None;
        }

        let key = inner.registry.lock().add(element.clone(), completion);

        let region = inner.observation_region();
        let mut faults = Vec::new();
        inner.evaluate_entry(key, element, &region, &mut faults);
        inner.report(faults);

        Some(key)
    }

    /// Unregister every entry watching `element`, or only those using
    /// `completion` when given.
    pub fn remove_callback(
        &self,
        element: &EOF<T>,
        completion: Option<&CompletionFn<EOF<T>>>,
    ) {
        if !self.inner.document.is_element(element) {
            return;
        }
        let removed = self.inner.registry.lock().remove_where(|watched, watched_completion| {
            watched == element && completion.map_or(true, |c| same_completion(c, watched_completion))
        });
        trace!(removed, "callbacks unregistered");
    }

    /// Elements of all watched entries, in registration order. An entry
    /// whose completion is running is not listed until it is put back.
    pub fn elements(&self) -> Vec<EOF<T>> {
        self.inner.registry.lock().elements()
    }

    /// Attach an interceptor. Listeners run most-recently-added first; the
    /// same listener is only attached once.
    pub fn add_start_listener(
        &self,
        listener: StartListener<EOF<T>>,
    ) {
        self.inner.interceptors.add_listener(listener);
    }

    /// Run one evaluation pass now, outside the rate-limited schedule.
    pub fn refresh(&self) {
        self.inner.evaluate();
    }

    pub fn pause(&self) {
        self.inner.pause();
    }

    pub fn resume(&self) {
        self.inner.resume();
    }

    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Replace the margin. Applies from the next evaluation on.
    pub fn set_margin(
        &self,
        margin: impl Into<MarginConfig>,
    ) {
        let margin = margin.into().resolve();
        debug!(?margin, "margin updated");
        self.inner.margin.store(Arc::new(margin));
    }

    pub fn margin(&self) -> Margin {
        **self.inner.margin.load()
    }

    pub fn config(&self) -> &LazyloadConfig {
        &self.inner.config
    }

    pub fn state(&self) -> EngineState {
        *self.inner.state.lock()
    }

    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }
}

impl<T: TypeConfig> EngineInner<T> {
    fn is_destroyed(&self) -> bool {
        self.state.lock().is_destroyed()
    }

    fn is_markable(
        &self,
        element: &EOF<T>,
    ) -> bool {
        self.document
            .attribute(element, &self.config.attribute)
            .is_some_and(|value| !value.is_empty())
    }

    fn resolve_target(
        &self,
        target: Target<EOF<T>>,
    ) -> Vec<EOF<T>> {
        match target {
            Target::Selector(selector) => self.document.query_selector_all(&selector),
            Target::Element(element) => vec![element],
            Target::Elements(elements) => elements,
        }
    }

    fn watched_signals(&self) -> Vec<Signal> {
        let mut signals = vec![Signal::Scroll, Signal::Resize, Signal::PointerMove];
        if self.container.is_some() {
            signals.push(Signal::ContainerResize);
        }
        signals
    }

    fn observation_region(&self) -> ObservationRegion {
        let bounds = self.geometry.observation_region_bounds(self.container.as_ref());
        ObservationRegion::from_bounds(bounds, &self.margin.load())
    }

    fn on_signal(&self) {
        if *self.state.lock() != EngineState::Active {
            return;
        }
        self.limiter.signal();
    }

    /// One pass over every watched entry.
    fn evaluate(&self) {
        if self.is_destroyed() {
            return;
        }

        let entries = self.registry.lock().snapshot();
        let region = self.observation_region();
        let mut faults = Vec::new();
        let mut completed = 0usize;

        for (key, entry) in &entries {
            if self.evaluate_entry(*key, &entry.element, &region, &mut faults) {
                completed += 1;
            }
        }

        let remaining = self.registry.lock().len();
        metrics::EVALUATION_PASSES.inc();
        metrics::WATCHED_ENTRIES.set(remaining as i64);
        debug!(
            visited = entries.len(),
            completed,
            remaining,
            faults = faults.len(),
            "evaluation pass finished"
        );

        self.report(faults);

        if self.config.auto_destroy && self.nothing_watched() {
            self.destroy();
        }
    }

    /// Run the completion registered under `key` if `element` intersects
    /// `region`, and unregister it unless it asks to keep watching. Returns
    /// whether the completion ran.
    ///
    /// The entry is taken out of the registry before its completion runs, so
    /// nested passes (a completion calling `refresh`) and concurrent ones
    /// never invoke it a second time.
    fn evaluate_entry(
        &self,
        key: WatchKey,
        element: &EOF<T>,
        region: &ObservationRegion,
        faults: &mut Vec<Fault>,
    ) -> bool {
        if !self.is_visible(element, region) {
            trace!(%key, "entry outside observation region");
            return false;
        }
        let entry = {
            let mut registry = self.registry.lock();
            // Unregistered or claimed by another pass
            let Some(entry) = registry.take(key) else {
                return false;
            };
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            entry
        };

        metrics::COMPLETIONS.inc();
        let keep_watching = match catch_unwind(AssertUnwindSafe(|| (entry.completion)(&entry.element))) {
            Ok(Ok(Completion::KeepWatching)) => true,
            Ok(Ok(Completion::Done)) => false,
            Ok(Err(e)) => {
                faults.push(Fault::from_error(key, e));
                false
            }
            Err(payload) => {
                faults.push(Fault::completion(key, panic_message(payload.as_ref())));
                false
            }
        };

        {
            let mut registry = self.registry.lock();
            if keep_watching && !self.is_destroyed() {
                registry.restore(key, entry);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        trace!(%key, keep_watching, "completion invoked");
        true
    }

    /// No entry registered and none out for its completion.
    fn nothing_watched(&self) -> bool {
        let registry = self.registry.lock();
        registry.is_empty() && self.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Zero-size elements are skipped before their position is queried.
    fn is_visible(
        &self,
        element: &EOF<T>,
        region: &ObservationRegion,
    ) -> bool {
        let (width, height) = self.geometry.element_size(element);
        if width == 0.0 && height == 0.0 {
            return false;
        }
        intersects(&self.geometry.element_bounding_rect(element), region)
    }

    fn report(
        &self,
        faults: Vec<Fault>,
    ) {
        for fault in faults {
            metrics::COMPLETION_FAULTS.inc();
            self.fault_reporter.report(fault);
        }
    }

    fn subscribe_all(&self) {
        for signal in self.watched_signals() {
            self.signals.subscribe(signal, self.handler.clone());
        }
    }

    fn unsubscribe_all(&self) {
        for signal in self.watched_signals() {
            self.signals.unsubscribe(signal, &self.handler);
        }
    }

    fn resume(&self) {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Paused {
                return;
            }
            *state = EngineState::Active;
        }
        self.subscribe_all();
        info!("lazyload engine active");
    }

    fn pause(&self) {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Active {
                return;
            }
            *state = EngineState::Paused;
        }
        self.unsubscribe_all();
        self.limiter.stop();
        info!("lazyload engine paused");
    }

    fn destroy(&self) {
        let previous = {
            let mut state = self.state.lock();
            if state.is_destroyed() {
                return;
            }
            std::mem::replace(&mut *state, EngineState::Destroyed)
        };
        if previous == EngineState::Active {
            self.unsubscribe_all();
        }
        self.limiter.stop();

        let dropped = {
            let mut registry = self.registry.lock();
            let len = registry.len();
            registry.clear();
            len
        };
        metrics::WATCHED_ENTRIES.set(0);
        info!(dropped, "lazyload engine destroyed");
    }
}

/// Completion shared by marked elements: run the interceptor chain on the
/// marker value, then apply the resulting source.
fn image_completion<T: TypeConfig>(
    document: Arc<DOF<T>>,
    interceptors: Arc<InterceptorChain<EOF<T>>>,
    attribute: String,
) -> CompletionFn<EOF<T>> {
    completion_fn(move |element: &EOF<T>| {
        let event = LoadEvent::image(element.clone(), document.attribute(element, &attribute));
        let document = document.clone();
        let attribute = attribute.clone();
        interceptors.run(event, move |event| {
            apply_loaded_source::<T>(&document, &attribute, event)
        })?;
        Ok(Completion::Done)
    })
}

fn apply_loaded_source<T: TypeConfig>(
    document: &DOF<T>,
    attribute: &str,
    event: LoadEvent<EOF<T>>,
) {
    let LoadEvent { element, src, .. } = event;
    document.remove_attribute(&element, attribute);

    let Some(src) = src.filter(|src| !src.is_empty()) else {
        return;
    };
    match document.kind(&element) {
        ElementKind::Image => {
            if document.attribute(&element, SRC_ATTRIBUTE).as_deref() != Some(src.as_str()) {
                document.set_attribute(&element, SRC_ATTRIBUTE, &src);
            }
        }
        ElementKind::Other => document.set_background_image(&element, &src),
    }
    trace!(%src, "source applied");
}
