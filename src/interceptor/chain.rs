use std::fmt;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::errors::panic_message;
use crate::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Image,
}

/// Payload threaded through the interceptor chain.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent<E> {
    pub kind: LoadKind,
    pub element: E,
    /// Resource to load. Listeners may rewrite or clear it.
    pub src: Option<String>,
}

impl<E> LoadEvent<E> {
    pub fn image(
        element: E,
        src: Option<String>,
    ) -> Self {
        Self {
            kind: LoadKind::Image,
            element,
            src,
        }
    }
}

pub type StartListener<E> = Arc<dyn Fn(LoadEvent<E>, Proceed<E>) + Send + Sync>;

/// Wrap a closure as a [`StartListener`].
pub fn start_listener<E, F>(f: F) -> StartListener<E>
where
    F: Fn(LoadEvent<E>, Proceed<E>) + Send + Sync + 'static,
{
    Arc::new(f)
}

type OnComplete<E> = Box<dyn FnOnce(LoadEvent<E>) + Send>;

/// Continuation handed to each listener.
///
/// Consumed on use, so a listener can advance the chain at most once. A
/// listener that drops it without calling stalls the chain for that event.
pub struct Proceed<E> {
    remaining: Vec<StartListener<E>>,
    on_complete: OnComplete<E>,
}

impl<E> Proceed<E> {
    pub fn proceed(
        mut self,
        event: LoadEvent<E>,
    ) {
        match self.remaining.pop() {
            Some(next) => next(event, self),
            None => (self.on_complete)(event),
        }
    }

    /// Listeners still to run after the current one.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl<E> fmt::Debug for Proceed<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Proceed").field("remaining", &self.remaining.len()).finish_non_exhaustive()
    }
}

/// Ordered, append-only list of start listeners.
pub struct InterceptorChain<E> {
    listeners: Mutex<Vec<StartListener<E>>>,
}

impl<E> Default for InterceptorChain<E> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for InterceptorChain<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("InterceptorChain").field("listeners", &self.len()).finish()
    }
}

impl<E> InterceptorChain<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener`. Registering the same listener twice is a no-op;
    /// returns whether it was added.
    pub fn add_listener(
        &self,
        listener: StartListener<E>,
    ) -> bool {
        let mut listeners = self.listeners.lock();
        let duplicate = listeners
            .iter()
            .any(|l| Arc::as_ptr(l) as *const () == Arc::as_ptr(&listener) as *const ());
        if duplicate {
            trace!("start listener already registered");
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Run the listeners registered at call time, last-added first, then
    /// `on_complete` once every listener has proceeded.
    ///
    /// A panic raised synchronously anywhere along the chain is caught and
    /// returned as [`Error::Interceptor`]; work deferred by a listener is
    /// outside this call.
    pub fn run<F>(
        &self,
        event: LoadEvent<E>,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(LoadEvent<E>) + Send + 'static,
    {
        let remaining = self.listeners.lock().clone();
        let proceed = Proceed {
            remaining,
            on_complete: Box::new(on_complete),
        };

        catch_unwind(AssertUnwindSafe(|| proceed.proceed(event)))
            .map_err(|payload| Error::Interceptor(panic_message(payload.as_ref())))
    }
}
