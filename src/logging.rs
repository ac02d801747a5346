//! Tracing subscriber setup for the `swm` binary.
//!
//! Logs always go to stderr so stdout stays reserved for command output
//! (and for the JSON-lines protocol in `swm session`).

use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter for the given verbosity flags.
///
/// `quiet` wins over `verbose`: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "swm=error";
    }
    match verbose {
        0 => "swm=warn",
        1 => "swm=info",
        2 => "swm=debug",
        _ => "swm=trace",
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the verbosity flags when set.
///
/// | Mode | TTY | Output |
/// |------|-----|--------|
/// | Robot | any | JSON lines |
/// | Human | yes | Colored, full format |
/// | Human | no | Compact plain text |
pub fn init_logging(robot_mode: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let base = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(io::stderr);

    // A second init (e.g. from tests) is ignored.
    let _ = if robot_mode {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.json().with_target(true))
            .try_init()
    } else if io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.with_target(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.with_ansi(false).with_target(false).compact())
            .try_init()
    };
}
