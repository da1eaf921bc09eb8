//! Pluggable config validation strategies
//!
//! Schema validation looks only at the values; filesystem validation also
//! checks that referenced files exist. Loader and optimizer identifiers are
//! checked later against the pipeline registries.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};
use crate::output::OutputDescriptor;

pub trait ConfigValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use kiln_config::{ConfigValidator, KilnConfig, SchemaValidator};
///
/// let mut config = KilnConfig::default();
/// config.explicit_entries = vec!["js/app.js".into()];
///
/// SchemaValidator.validate(&config).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        if config.glob_patterns.is_empty() && config.explicit_entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        if config.name.trim().is_empty() {
            return Err(schema_error(
                "bundle name cannot be empty",
                "Set 'name' or remove it to use the default \"app\"",
            ));
        }

        for (index, rule) in config.rules.iter().enumerate() {
            check_regex(&format!("rules[{index}].test"), &rule.test)?;
            for (i, pattern) in rule.exclude.iter().enumerate() {
                check_regex(&format!("rules[{index}].exclude[{i}]"), pattern)?;
            }
            if rule.chain.iter().any(|t| t.loader.trim().is_empty()) {
                return Err(schema_error(
                    format!("rules[{index}].use contains an empty loader name"),
                    "Name a loader such as \"css-loader\" or \"command\"",
                ));
            }
        }

        for (index, optimizer) in config.optimizers.iter().enumerate() {
            if optimizer.optimizer.trim().is_empty() {
                return Err(schema_error(
                    format!("optimizers[{index}] has an empty name"),
                    "Name an optimizer such as \"css-minify\" or \"command\"",
                ));
            }
            if let Some(test) = &optimizer.test {
                check_regex(&format!("optimizers[{index}].test"), test)?;
            }
        }

        check_descriptor("output.development", &config.output.development)?;
        check_descriptor("output.production", &config.output.production)?;

        let dev = &config.output.development;
        let prod = &config.output.production;
        if dev.path == prod.path && dev.public_path == prod.public_path {
            return Err(schema_error(
                "development and production outputs share both directory and public path",
                "Give each mode its own output path or public path",
            ));
        }

        if !prod.public_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "output.production.publicPath",
                format!("'{}' must be root-relative (start with '/')", prod.public_path),
            ));
        }

        if let Some(dev_server) = &config.dev_server {
            if !dev_server.public_path.starts_with('/') {
                return Err(ConfigError::invalid(
                    "devServer.publicPath",
                    format!("'{}' must start with '/'", dev_server.public_path),
                ));
            }
        }

        Ok(())
    }
}

/// Filesystem validator (for CLI use)
///
/// Runs schema validation, then checks that explicit entries and copy sources
/// exist below the root.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        for entry in &config.explicit_entries {
            let path = self.root.join(entry);
            if !path.is_file() {
                return Err(ConfigError::EntryNotFound { path });
            }
        }

        for pattern in &config.copy {
            let path = self.root.join(&pattern.from);
            if !path.is_dir() {
                return Err(ConfigError::CopySourceNotFound { path });
            }
        }

        Ok(())
    }
}

pub fn validate_schema(config: &KilnConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

pub fn validate_fs(config: &KilnConfig, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}

fn schema_error(message: impl Into<String>, hint: impl Into<String>) -> ConfigError {
    ConfigError::SchemaValidation {
        message: message.into(),
        hint: Some(hint.into()),
    }
}

fn check_regex(field: &str, pattern: &str) -> Result<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(field, format!("invalid regular expression: {e}")))
}

fn check_descriptor(field: &str, descriptor: &OutputDescriptor) -> Result<()> {
    if descriptor.filename.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("{field}.filename"),
            "filename template cannot be empty",
        ));
    }
    if descriptor.extract_filename.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("{field}.extractFilename"),
            "extract filename template cannot be empty",
        ));
    }
    if descriptor.path.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            format!("{field}.path"),
            "output directory cannot be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::DevServerConfig;
    use crate::output::CopyPattern;
    use crate::rule::{RuleConfig, TransformRef};
    use std::fs;
    use tempfile::TempDir;

    fn config_with_entry() -> KilnConfig {
        KilnConfig {
            explicit_entries: vec![PathBuf::from("js/app.js")],
            ..KilnConfig::default()
        }
    }

    #[test]
    fn rejects_missing_entries() {
        let err = SchemaValidator.validate(&KilnConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoEntries));
    }

    #[test]
    fn glob_patterns_alone_are_enough() {
        let config = KilnConfig {
            glob_patterns: vec!["vendor/**/*.js".into()],
            ..KilnConfig::default()
        };
        assert!(validate_schema(&config).is_ok());
    }

    #[test]
    fn rejects_invalid_rule_regex() {
        let mut config = config_with_entry();
        config.rules.push(
            RuleConfig::new("\\.css$")
                .exclude("node_modules(")
                .with(TransformRef::new("css-loader")),
        );

        let err = validate_schema(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "rules[0].exclude[0]")
        );
    }

    #[test]
    fn rejects_shared_output_location() {
        let mut config = config_with_entry();
        config.output.development.path = "dist".into();
        config.output.development.public_path = "/".into();

        let err = validate_schema(&config).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn same_directory_with_different_public_path_is_allowed() {
        let mut config = config_with_entry();
        config.output.development.path = "dist".into();
        assert!(validate_schema(&config).is_ok());
    }

    #[test]
    fn rejects_relative_production_public_path() {
        let mut config = config_with_entry();
        config.output.production.public_path = "static/".into();

        let err = validate_schema(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "output.production.publicPath")
        );
    }

    #[test]
    fn rejects_dev_server_public_path_without_slash() {
        let mut config = config_with_entry();
        config.dev_server = Some(DevServerConfig {
            public_path: "public".into(),
            ..DevServerConfig::default()
        });

        let err = validate_schema(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "devServer.publicPath")
        );
    }

    #[test]
    fn rejects_empty_filename_template() {
        let mut config = config_with_entry();
        config.output.production.filename = " ".into();

        let err = validate_schema(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "output.production.filename")
        );
    }

    #[test]
    fn fs_validator_reports_missing_entry() {
        let dir = TempDir::new().unwrap();
        let err = validate_fs(&config_with_entry(), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EntryNotFound { .. }));
    }

    #[test]
    fn fs_validator_checks_copy_sources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        fs::write(dir.path().join("js/app.js"), "console.log(1);").unwrap();

        let mut config = config_with_entry();
        config.copy.push(CopyPattern::new("static", "."));

        let err = validate_fs(&config, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::CopySourceNotFound { .. }));

        fs::create_dir_all(dir.path().join("static")).unwrap();
        assert!(validate_fs(&config, dir.path()).is_ok());
    }
}
