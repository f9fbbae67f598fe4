// src/logging.rs
// =============================================================================
// Logging init for the binary. The library itself only emits tracing events.
// =============================================================================

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter is picked from the number of
/// `-v` flags. Calling this twice is harmless (the second call is ignored).
pub fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn,deadlink_checker=info",
        1 => "info,deadlink_checker=debug",
        _ => "debug",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
