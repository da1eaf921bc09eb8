use crate::cli::ProjectArgs;
use crate::config::{CliOverrides, ProjectConfig};
use crate::error::{CliError, Result, ResultExt};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use kiln_config::{ConfigDiscovery, ConfigError, KilnConfig, read_value};
use std::path::{Path, PathBuf};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "KILN_";

impl ProjectConfig {
    /// Resolve the project root and load its layered configuration.
    ///
    /// A missing config file is not an error here: defaults, environment and
    /// flags may still describe a buildable project. An explicit `--config`
    /// that does not exist is.
    pub fn load(project: &ProjectArgs, overrides: &CliOverrides) -> Result<Self> {
        let root = resolve_root(project.root.as_deref())?;

        let source = match &project.config {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                };
                if !path.is_file() {
                    return Err(CliError::FileNotFound(path));
                }
                Some(path)
            }
            None => ConfigDiscovery::new(&root).find(),
        };

        match &source {
            Some(path) => tracing::debug!(path = %path.display(), "using config file"),
            None => tracing::debug!(root = %root.display(), "no config file found"),
        }

        let config: KilnConfig = layered(source.as_deref(), overrides)?
            .extract()
            .map_err(figment_error)?;

        Ok(Self {
            root,
            source,
            config,
        })
    }
}

/// Build the figment for a config file and a set of flag overrides.
pub fn layered(source: Option<&Path>, overrides: &CliOverrides) -> Result<Figment> {
    let mut figment = Figment::new().merge(Serialized::defaults(KilnConfig::default()));

    if let Some(path) = source {
        figment = merge_file(figment, path)?;
    }

    figment = figment.merge(
        Env::prefixed(ENV_PREFIX)
            .map(|key| env_key_to_path(key.as_str()).into())
            .lowercase(false),
    );

    Ok(figment.merge(Serialized::defaults(overrides.clone())))
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if file_name == "package.json" {
        // Only the "kiln" field of package.json is configuration.
        return Ok(figment.merge(Serialized::defaults(read_value(path)?)));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        Some("json") => Ok(figment.merge(Json::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

/// Map an environment key (prefix already stripped) to a config path.
///
/// `__` separates nesting levels and each level is converted from
/// `SCREAMING_SNAKE` to camelCase: `DEV_SERVER__WRITE_TO_DISK` becomes
/// `devServer.writeToDisk`.
pub fn env_key_to_path(key: &str) -> String {
    key.split("__")
        .map(snake_to_camel)
        .collect::<Vec<_>>()
        .join(".")
}

fn snake_to_camel(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (i, word) in segment.split('_').filter(|w| !w.is_empty()).enumerate() {
        let word = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let root = match root {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd,
    };
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    root.canonicalize().with_path(&root)
}

fn figment_error(err: figment::Error) -> CliError {
    let field = if err.path.is_empty() {
        "configuration".to_string()
    } else {
        err.path.join(".")
    };
    ConfigError::InvalidValue {
        field,
        hint: Some(err.to_string()),
    }
    .into()
}
