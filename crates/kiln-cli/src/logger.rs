//! Logging setup for the kiln CLI.
//!
//! Library crates only emit `tracing` events; this installs the subscriber.
//!
//! The filter is chosen in this order:
//! 1. `--verbose`: debug for the kiln crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for the kiln crates
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "kiln=debug,kiln_cli=debug,kiln_pipeline=debug,kiln_config=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "kiln=info,kiln_cli=info,kiln_pipeline=info,kiln_config=info";

/// Install the global tracing subscriber. Call once, early in `main`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Install the global subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact();

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Whether log output should carry ANSI colors.
///
/// `NO_COLOR` disables and `FORCE_COLOR` enables regardless of the terminal.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_parses() {
        let filter = filter_for(true, false);
        assert!(filter.to_string().contains("kiln_pipeline=debug"));
    }

    #[test]
    fn test_quiet_filter_parses() {
        let filter = filter_for(false, true);
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
