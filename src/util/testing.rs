//! Shared setup for unit and integration tests.

use std::env;
use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Targets whose trace output drowns the inventory logs.
const QUIET_TARGETS: [&str; 3] = ["config::", "walkdir", "tree_sitter"];

/// Install a stderr subscriber once per test binary.
///
/// `RUST_LOG` wins when set; otherwise everything down to trace is shown.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
        let quiet = filter_fn(|metadata| {
            !QUIET_TARGETS
                .iter()
                .any(|target| metadata.target().starts_with(target))
        });

        let layer = fmt::layer()
            .with_target(true)
            .with_test_writer()
            .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
            .with_filter(quiet)
            .with_filter(env_filter);

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            eprintln!("tracing subscriber already installed");
        }
        info!(
            rust_log = env::var("RUST_LOG").unwrap_or_default(),
            "symtree test setup complete"
        );
    });
}
