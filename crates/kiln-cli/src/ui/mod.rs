//! Terminal output: status lines and build summaries.
//!
//! Everything here writes to stderr so stdout stays free for machine
//! output such as `kiln check --schema`.
//!
//! ```no_run
//! use kiln_cli::ui;
//!
//! ui::init_colors(false);
//! ui::success("Build successful");
//! ui::error("Failed to read kiln.toml");
//! ```

mod format;
mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, format_size, print_build_errors, print_build_summary};
pub use messages::{debug, error, info, success, warning};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether
/// stderr is attended.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr() && !is_ci()
}

static COLORS: AtomicBool = AtomicBool::new(true);

/// Decide once whether status lines are colored. `no_color` forces plain output.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_colors_no_color() {
        init_colors(true);
        assert!(!colors_enabled());
    }

    #[test]
    fn test_is_ci_does_not_panic() {
        let _ = is_ci();
    }
}
