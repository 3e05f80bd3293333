//! Collapse high-frequency signals into bounded-frequency invocations.
//!
//! Two policies are supported:
//!
//! - [`RateLimitPolicy::Throttle`]: the first signal of an idle period runs
//!   immediately; later signals inside the interval collapse into a single
//!   trailing call at `last_start + interval`.
//! - [`RateLimitPolicy::Buffer`]: every signal restarts the timer; the
//!   callback runs once the signal stream has been quiet for the interval.
//!
//! At most one timer is pending at any time. Timers are Tokio tasks; without
//! a current runtime a call that would be deferred runs inline instead.

use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::time::sleep_until;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use tracing::warn;

/// A run that started but never finished is considered stale after this many
/// intervals, and the next signal runs immediately.
pub(crate) const STARVATION_FACTOR: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    #[default]
    Throttle,
    Buffer,
}

/// Callback gated by a [`RateLimiter`].
pub type GatedFn = Arc<dyn Fn() + Send + Sync>;

/// Fire-and-forget gate around a callback.
///
/// Cloning shares the same timer state.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    callback: GatedFn,
    interval: Duration,
    policy: RateLimitPolicy,
    state: Mutex<LimiterState>,
}

#[derive(Default)]
struct LimiterState {
    last_start: Option<Instant>,
    last_end: Option<Instant>,
    pending: Option<Pending>,
    generation: u64,
}

struct Pending {
    generation: u64,
    token: CancellationToken,
}

impl LimiterState {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }
}

enum Decision {
    RunNow,
    Deferred,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.inner.interval)
            .field("policy", &self.inner.policy)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// A zero `interval` disables coalescing: every signal runs synchronously.
    pub fn new<F>(
        policy: RateLimitPolicy,
        interval: Duration,
        callback: F,
    ) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(LimiterInner {
                callback: Arc::new(callback),
                interval,
                policy,
                state: Mutex::new(LimiterState::default()),
            }),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.inner.policy
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Whether a deferred invocation is currently scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Deliver one trigger signal.
    pub fn signal(&self) {
        if self.inner.interval.is_zero() {
            LimiterInner::run(&self.inner, None);
            return;
        }

        let decision = match self.inner.policy {
            RateLimitPolicy::Throttle => self.throttle(),
            RateLimitPolicy::Buffer => self.buffer(),
        };

        if let Decision::RunNow = decision {
            LimiterInner::run(&self.inner, None);
        }
    }

    /// Cancel any scheduled invocation without running it.
    pub fn stop(&self) {
        if self.inner.state.lock().cancel_pending() {
            trace!("rate limiter: pending invocation cancelled");
        }
    }

    fn throttle(&self) -> Decision {
        let now = Instant::now();
        let interval = self.inner.interval;
        let mut state = self.inner.state.lock();

        let run_now = match (state.last_start, state.last_end) {
            (None, _) => true,
            (Some(start), Some(end)) if end >= start => now.duration_since(end) > interval,
            (Some(start), _) => now.duration_since(start) > interval * STARVATION_FACTOR,
        };
        if run_now {
            return Decision::RunNow;
        }

        if state.pending.is_some() {
            return Decision::Deferred;
        }

        let deadline = state.last_start.map(|start| start + interval).unwrap_or(now + interval);
        self.schedule(&mut state, deadline)
    }

    fn buffer(&self) -> Decision {
        let deadline = Instant::now() + self.inner.interval;
        let mut state = self.inner.state.lock();
        state.cancel_pending();
        self.schedule(&mut state, deadline)
    }

    fn schedule(
        &self,
        state: &mut LimiterState,
        deadline: Instant,
    ) -> Decision {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("rate limiter: no tokio runtime, running deferred call inline");
                return Decision::RunNow;
            }
        };

        state.generation += 1;
        let generation = state.generation;
        let token = CancellationToken::new();
        state.pending = Some(Pending {
            generation,
            token: token.clone(),
        });

        let weak: Weak<LimiterInner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    return;
                }
                _ = sleep_until(deadline) => {}
            }
            if let Some(inner) = weak.upgrade() {
                LimiterInner::run(&inner, Some(generation));
            }
        });

        trace!(generation, "rate limiter: invocation scheduled");
        Decision::Deferred
    }
}

impl LimiterInner {
    /// Run the callback. A timer passes its generation and is dropped if it is
    /// no longer the pending one.
    fn run(
        this: &Arc<Self>,
        timer_generation: Option<u64>,
    ) {
        {
            let mut state = this.state.lock();
            if let Some(generation) = timer_generation {
                match &state.pending {
                    Some(pending) if pending.generation == generation => {}
                    _ => return,
                }
            }
            state.cancel_pending();
            state.last_start = Some(Instant::now());
        }

        (this.callback)();

        this.state.lock().last_end = Some(Instant::now());
    }
}
