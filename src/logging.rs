use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Level used when `RUST_LOG` is unset or invalid. Kept at `error` so the
/// probes' report lines are the only output by default.
pub const DEFAULT_LEVEL: &str = "error";

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
