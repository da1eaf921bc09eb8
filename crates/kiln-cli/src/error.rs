//! Error handling for the kiln CLI.
//!
//! `CliError` wraps the library errors from `kiln-config` and
//! `kiln-pipeline` alongside the CLI's own failures (server, watcher,
//! arguments). `main` converts it into a miette report.

mod report;

pub use report::cli_error_to_miette;

use kiln_pipeline::BuildOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] kiln_config::ConfigError),

    /// Resolution, write or cancellation error from the pipeline
    #[error("Build error: {0}")]
    Pipeline(#[from] kiln_pipeline::Error),

    /// The build ran but did not succeed for every file
    #[error("Build {} with {errors} error(s)", .outcome.as_str())]
    BuildFailed {
        outcome: BuildOutcome,
        errors: usize,
    },

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a `NotFound` I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_from_config_error() {
        let cli_err: CliError = kiln_config::ConfigError::NotFound.into();
        assert!(matches!(cli_err, CliError::Config(_)));
        assert!(cli_err.to_string().contains("config not found"));
    }

    #[test]
    fn test_cli_error_from_pipeline_error() {
        let cli_err: CliError = kiln_pipeline::Error::NoEntries.into();
        assert!(matches!(cli_err, CliError::Pipeline(_)));
        assert!(cli_err.to_string().starts_with("Build error: no entries"));
    }

    #[test]
    fn test_build_failed_message() {
        let err = CliError::BuildFailed {
            outcome: BuildOutcome::Partial,
            errors: 2,
        };
        assert_eq!(err.to_string(), "Build partial with 2 error(s)");
    }

    #[test]
    fn test_result_ext_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let err = result.with_path("/test/kiln.toml").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(p) if p == PathBuf::from("/test/kiln.toml")));
    }

    #[test]
    fn test_result_ext_with_path_keeps_other_io_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let err = result.with_path("/test/kiln.toml").unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
