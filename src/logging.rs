//! Tracing subscriber setup for the CLI.
//!
//! Logs go to stderr so stdout stays parseable. `RUST_LOG` takes precedence
//! over the verbosity flag.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a `-v` count.
pub fn directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,xkcd_archive=info,xka=info",
        1 => "warn,xkcd_archive=debug,xka=debug",
        _ => "info,xkcd_archive=trace,xka=trace",
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
