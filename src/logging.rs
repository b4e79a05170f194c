//! Logging initialization for hosts embedding the preview pipeline.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's call.

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(verbosity: u8) -> EnvFilter {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG wins for other targets; verbosity sets this crate's level.
    let directive: Directive = format!("preview_native={level}")
        .parse()
        .unwrap_or_else(|_| level.into());
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(directive)
}

/// Install the global subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, write JSON lines to stderr
///
/// # Panics
/// Panics if a global subscriber is already installed.
pub fn init(verbosity: u8, json: bool) {
    let subscriber = tracing_subscriber::registry().with(filter(verbosity));

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Like [`init`], but returns `false` instead of panicking when a subscriber
/// is already installed (Node addons may be loaded more than once).
pub fn try_init(verbosity: u8, json: bool) -> bool {
    let subscriber = tracing_subscriber::registry().with(filter(verbosity));

    let result = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    result.is_ok()
}
