//! File-based config discovery for CLI use
//!
//! Handles finding and loading kiln configuration files from a project root.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};
use crate::mode::BuildMode;

/// Config file names probed in a project root, in priority order.
pub const CONFIG_FILES: [&str; 2] = ["kiln.toml", "kiln.config.json"];

/// Field read from `package.json` when no dedicated config file exists.
pub const PACKAGE_FIELD: &str = "kiln";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use kiln_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new("assets");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. `kiln.toml`
    /// 2. `kiln.config.json`
    /// 3. `package.json` with a non-null `kiln` field
    pub fn find(&self) -> Option<PathBuf> {
        for name in CONFIG_FILES {
            let path = self.root.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        match parsed.get(PACKAGE_FIELD) {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<KilnConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        load_from(&path)
    }

    pub fn load_for_mode(&self, mode: BuildMode) -> Result<KilnConfig> {
        self.load()?.materialize_mode(mode)
    }
}

/// Read a config file as a raw JSON value, dispatching on its name.
///
/// For `package.json` only the `kiln` field is returned.
pub fn read_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if file_name == "package.json" {
        let parsed: Value = serde_json::from_str(&content).map_err(|e| {
            ConfigError::invalid("package.json", format!("Invalid JSON: {e}"))
        })?;
        return match parsed.get(PACKAGE_FIELD) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(ConfigError::invalid(
                PACKAGE_FIELD,
                "Add a 'kiln' field to your package.json",
            )),
        };
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let toml_val: toml::Value = toml::from_str(&content).map_err(|e| {
                ConfigError::invalid("toml", format!("Invalid TOML syntax: {e}"))
            })?;
            serde_json::to_value(toml_val).map_err(|e| {
                ConfigError::invalid("toml", format!("TOML to JSON conversion failed: {e}"))
            })
        }
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid("json", format!("Invalid JSON: {e}"))),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a config from a specific file.
pub fn load_from(path: &Path) -> Result<KilnConfig> {
    tracing::debug!(path = %path.display(), "loading kiln config");
    KilnConfig::from_value(read_value(path)?)
}

/// Discover and load config from the current directory.
pub fn discover() -> Result<KilnConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load()
}

/// Discover config in the current directory and materialize it for `mode`.
pub fn discover_for_mode(mode: BuildMode) -> Result<KilnConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load_for_mode(mode)
}
