use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;


lazy_static! {
    pub static ref EVALUATION_PASSES: IntCounter = IntCounter::with_opts(Opts::new(
        "lazyload_evaluation_passes_total",
        "Number of evaluation passes over the watched entries"
    ))
    .expect("metric can not be created");

    pub static ref COMPLETIONS: IntCounter = IntCounter::with_opts(Opts::new(
        "lazyload_completions_total",
        "Number of completions invoked for intersecting entries"
    ))
    .expect("metric can not be created");

    pub static ref COMPLETION_FAULTS: IntCounter = IntCounter::with_opts(Opts::new(
        "lazyload_completion_faults_total",
        "Number of completions that failed or panicked"
    ))
    .expect("metric can not be created");

    pub static ref WATCHED_ENTRIES: IntGauge = IntGauge::with_opts(Opts::new(
        "lazyload_watched_entries",
        "Entries still watched after the latest evaluation pass"
    ))
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry);
        registry
    };
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(EVALUATION_PASSES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(COMPLETIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(COMPLETION_FAULTS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCHED_ENTRIES.clone()))
        .expect("collector can be registered");
}

/// Export the engine metrics in Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode lazyload metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("lazyload metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
