//! Tracing subscriber setup shared by binaries and integration tests.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` when unset. Calling this more
/// than once is a no-op (the second install attempt is ignored), so test
/// binaries may call it from every test.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
