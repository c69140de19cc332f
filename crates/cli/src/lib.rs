pub mod commands;

use std::io;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `verbosity` counts `-v` flags: none logs warnings, one adds info, two or
/// more add debug. A `RUST_LOG` setting takes precedence.
pub fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded (tests, other frontends).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Split repeated and/or comma-separated flag values into a flat list.
///
/// `["a,b", "c"]` becomes `["a", "b", "c"]`; empty segments are dropped.
pub fn split_list<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
