use std::sync::Arc;
use std::time::Duration;

use lazyload_engine::start_listener;
use lazyload_engine::LazyloadConfig;
use lazyload_engine::LoadEvent;
use lazyload_engine::LoadKind;
use lazyload_engine::Proceed;
use parking_lot::Mutex;

use crate::common::builder;
use crate::common::El;
use crate::common::Page;

fn recorder(
    log: &Arc<Mutex<Vec<String>>>,
    name: &'static str,
) -> lazyload_engine::StartListener<El> {
    let log = log.clone();
    start_listener(move |event: LoadEvent<El>, proceed: Proceed<El>| {
        log.lock().push(name.to_string());
        proceed.proceed(event);
    })
}

/// Test: interceptor ordering
///
/// Scenario:
/// - listeners A then B are attached, plus the legacy `on_start` hook
/// - B runs before A, `on_start` last, and the image is applied only after
///   every listener proceeded
#[test]
fn most_recent_listener_runs_first() {
    let page = Page::new();
    let image = page.lazy_image("a.png", 2000.0);
    let log = Arc::new(Mutex::new(Vec::new()));
    let on_start_log = log.clone();
    let engine = builder(&page)
        .config(LazyloadConfig::persistent())
        .on_start(move |event: &mut LoadEvent<El>| {
            assert_eq!(event.kind, LoadKind::Image);
            on_start_log.lock().push("on_start".to_string());
        })
        .build();

    engine.add_start_listener(recorder(&log, "A"));
    engine.add_start_listener(recorder(&log, "B"));

    page.scroll_to(1800.0);
    engine.refresh();

    assert_eq!(*log.lock(), vec!["B", "A", "on_start"]);
    assert_eq!(page.src(image).as_deref(), Some("a.png"));
}

#[test]
fn listener_can_rewrite_source() {
    let page = Page::new();
    let image = page.lazy_image("photo.png", 2000.0);
    let engine = builder(&page).config(LazyloadConfig::persistent()).build();
    engine.add_start_listener(start_listener(|mut event: LoadEvent<El>, proceed: Proceed<El>| {
        event.src = event.src.map(|src| format!("https://cdn.example/{src}"));
        proceed.proceed(event);
    }));

    page.scroll_to(1800.0);
    engine.refresh();

    assert_eq!(page.src(image).as_deref(), Some("https://cdn.example/photo.png"));
}

/// Test: asynchronous interceptor
///
/// Scenario:
/// - the listener proceeds from a spawned task after a delay
/// - the engine has already dropped the entry; the element is updated once
///   the task proceeds
#[tokio::test(start_paused = true)]
async fn listener_may_proceed_from_a_task() {
    let page = Page::new();
    let image = page.lazy_image("a.png", 2000.0);
    let engine = builder(&page).config(LazyloadConfig::persistent()).build();
    engine.add_start_listener(start_listener(|event: LoadEvent<El>, proceed: Proceed<El>| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            proceed.proceed(event);
        });
    }));

    page.scroll_to(1800.0);
    engine.refresh();
    assert!(engine.is_empty());
    assert_eq!(page.src(image), None);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(page.src(image).as_deref(), Some("a.png"));
}
