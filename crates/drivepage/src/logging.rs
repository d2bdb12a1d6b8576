// Logging - tracing subscriber setup shared by tests and xtask

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "drivepage=info";

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default
/// [`DEFAULT_FILTER`]), writing through the test harness's captured output.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
