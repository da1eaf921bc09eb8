//! Miette report conversion for CLI errors.

use crate::error::CliError;
use kiln_config::ConfigError;
use miette::Report;

/// Convert a `CliError` into a miette report, attaching help where the fix
/// is predictable.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::Pipeline(e) => pipeline_error_to_miette(e),
        CliError::BuildFailed { .. } => miette::miette!(
            help = "Each failing file is listed above; files without errors were still built",
            "{}",
            err
        ),
        _ => miette::miette!("{}", err),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::NotFound => miette::miette!(
            help = "Create kiln.toml or kiln.config.json, add a \"kiln\" field to package.json, or run 'kiln init'",
            "Configuration error: {}",
            err
        ),
        ConfigError::NoEntries => miette::miette!(
            help = "Set globPatterns or explicitEntries",
            "Configuration error: {}",
            err
        ),
        ConfigError::SchemaValidation { ref message, hint: Some(ref hint) } => miette::miette!(
            help = hint.clone(),
            "Configuration error: schema validation failed: {}",
            message
        ),
        _ => miette::miette!("Configuration error: {}", err),
    }
}

fn pipeline_error_to_miette(err: kiln_pipeline::Error) -> Report {
    use kiln_pipeline::Error;

    match err {
        Error::NoEntries => miette::miette!(
            help = "Check that globPatterns match files under the project root",
            "Build error: {}",
            err
        ),
        Error::UnknownLoader(_) => miette::miette!(
            help = "Builtin loaders: css-loader, extract, mini-css-extract, command, raw",
            "Build error: {}",
            err
        ),
        Error::UnknownOptimizer(_) => miette::miette!(
            help = "Builtin optimizers: css-minify, command",
            "Build error: {}",
            err
        ),
        Error::InvalidPattern { .. } => miette::miette!(
            help = "Rule tests and excludes are regular expressions matched against the file path",
            "Build error: {}",
            err
        ),
        _ => miette::miette!("Build error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_has_help() {
        let report = cli_error_to_miette(CliError::Config(ConfigError::NotFound));
        let help = report.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("kiln init"));
    }

    #[test]
    fn test_unknown_loader_has_help() {
        let err = CliError::Pipeline(kiln_pipeline::Error::UnknownLoader("sass".into()));
        let report = cli_error_to_miette(err);
        assert!(report.to_string().contains("unknown loader 'sass'"));
        assert!(report.help().is_some());
    }

    #[test]
    fn test_plain_error_passthrough() {
        let report = cli_error_to_miette(CliError::Server("bind failed".into()));
        assert_eq!(report.to_string(), "Server error: bind failed");
    }
}
