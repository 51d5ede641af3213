//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing to stderr (Spin captures it).
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Returns `false` if a global subscriber was already installed, which is
/// expected when a component instance handles more than one request.
pub fn init_subscriber(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok()
}
