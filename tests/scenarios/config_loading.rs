use lazyload_engine::LazyloadConfig;
use lazyload_engine::Margin;
use lazyload_engine::RateLimitPolicy;
use serial_test::serial;
use temp_env::with_vars;

use crate::common::builder;
use crate::common::Page;

/// Test: configuration file and environment feed the engine
///
/// Scenario:
/// - `CONFIG_PATH` file sets a buffered policy and a custom attribute
/// - `LAZYLOAD__MARGIN__ALL` overrides the margin
#[test]
#[serial]
fn engine_uses_file_and_env_configuration() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("lazyload.toml");
    std::fs::write(
        &config_path,
        r#"
        attribute = "data-src"
        auto_destroy = false
        rate_limit = "buffer"
        duration_ms = 0
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("LAZYLOAD__MARGIN__ALL", Some("250")),
        ],
        || {
            let config = LazyloadConfig::new().unwrap();
            assert_eq!(config.rate_limit, RateLimitPolicy::Buffer);

            let page = Page::new();
            let engine = builder(&page).config(config).build();

            assert_eq!(engine.config().attribute, "data-src");
            assert_eq!(engine.config().duration_ms, 300);
            assert_eq!(engine.margin(), Margin::uniform(250.0));
        },
    );
}
