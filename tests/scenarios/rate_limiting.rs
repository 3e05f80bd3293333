use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use lazyload_engine::completion_fn;
use lazyload_engine::Completion;
use lazyload_engine::LazyloadConfig;
use lazyload_engine::RateLimitPolicy;
use lazyload_engine::Signal;
use tokio::time::advance;

use crate::common::builder;
use crate::common::El;
use crate::common::Page;
use crate::common::DOCUMENT;

/// Counts evaluation passes through a visible `KeepWatching` entry.
fn pass_counter(
    page: &Arc<Page>,
    config: LazyloadConfig,
) -> (lazyload_engine::Lazyload<crate::common::PageTypeConfig>, Arc<AtomicUsize>) {
    let engine = builder(page).config(config).build();
    let probe = page.element(DOCUMENT, "div", None, 10.0);
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = passes.clone();
    engine.add_callback(
        &probe,
        completion_fn(move |_: &El| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Completion::KeepWatching)
        }),
    );
    // Registration itself evaluates once
    passes.store(0, Ordering::SeqCst);
    (engine, passes)
}

/// Test: throttled burst
///
/// Scenario:
/// - interval 100ms, 30 scroll signals 10ms apart (burst of 290ms)
/// - at most ceil(290 / 100) + 1 = 4 passes, and a trailing pass after the
///   last signal
#[tokio::test(start_paused = true)]
async fn throttled_burst_is_bounded() {
    let page = Page::new();
    let config = LazyloadConfig {
        duration_ms: 100,
        ..LazyloadConfig::persistent()
    };
    let (_engine, passes) = pass_counter(&page, config);

    for _ in 0..30 {
        page.fire(Signal::Scroll);
        advance(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    let total = passes.load(Ordering::SeqCst);

    // Leading pass plus at least the trailing one
    assert!(total >= 2, "{total} passes");
    assert!(total <= 4, "{total} passes for a 290ms burst");
}

/// Test: buffered signals run once after the stream goes quiet
#[tokio::test(start_paused = true)]
async fn buffered_signals_run_once_when_quiet() {
    let page = Page::new();
    let config = LazyloadConfig {
        duration_ms: 100,
        rate_limit: RateLimitPolicy::Buffer,
        ..LazyloadConfig::persistent()
    };
    let (_engine, passes) = pass_counter(&page, config);

    for _ in 0..10 {
        page.fire(Signal::PointerMove);
        advance(Duration::from_millis(50)).await;
    }
    assert_eq!(passes.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(passes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_scheduled_pass() {
    let page = Page::new();
    let config = LazyloadConfig {
        duration_ms: 100,
        rate_limit: RateLimitPolicy::Buffer,
        ..LazyloadConfig::persistent()
    };
    let (engine, passes) = pass_counter(&page, config);

    page.fire(Signal::Resize);
    engine.pause();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(passes.load(Ordering::SeqCst), 0);
}
