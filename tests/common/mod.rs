use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

static TEST_SETUP: Once = Once::new();

/// Installs a global test subscriber once; `RUST_LOG` overrides the default
/// `arbor=debug` filter.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arbor=debug"));
        // Another test binary may already own the global subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .try_init();
    });
}
