//! Logging hooks for blockq.
//!
//! Build with `--features tracing` to route the crate's log macros to the
//! `tracing` ecosystem. Without the feature every macro expands to nothing,
//! so queue operations carry no logging cost.

/// Installs a `tracing-subscriber` registry for queue diagnostics.
///
/// The filter comes from `RUST_LOG` and falls back to `blockq=trace`. Intended
/// for tests and the benchmark binary; library code never calls it.
/// A no-op when the `tracing` feature is disabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockq=trace"));

    // A second installation (e.g. from another test binary thread) is harmless.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! log_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_noop as warn;
