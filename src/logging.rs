//! Diagnostic tracing for the `conductor` binary.
//!
//! Plan state and validation results go to the store; this is only for
//! watching the coordinator work.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output is compact and goes to
/// stderr so command output on stdout stays machine-readable.
///
/// ```bash
/// RUST_LOG=conductor=debug conductor status
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
