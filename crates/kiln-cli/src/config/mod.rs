//! Project configuration as the CLI sees it.
//!
//! Sources are layered with figment, later ones winning:
//!
//! 1. `KilnConfig::default()`
//! 2. the config file (`--config`, or discovered in the project root)
//! 3. `KILN_*` environment variables
//! 4. command-line flags
//!
//! The result is an unmaterialized [`KilnConfig`]; commands pick the mode
//! and call [`ProjectConfig::materialize`].

mod loading;

pub use loading::{env_key_to_path, layered};

use kiln_config::{BuildMode, KilnConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Values set on the command line, merged over every other source.
///
/// Only the fields that were given are serialized, so unset flags never
/// mask the config file or the environment.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<BuildMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerOverrides>,
}

/// `devServer` fields settable from `kiln dev`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_to_disk: Option<bool>,
}

impl DevServerOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.watch.is_none()
            && self.overlay.is_none()
            && self.write_to_disk.is_none()
    }
}

/// A loaded project: where it lives, which file configured it, and the
/// layered configuration.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Absolute project root.
    pub root: PathBuf,
    /// Config file that contributed, if any.
    pub source: Option<PathBuf>,
    pub config: KilnConfig,
}

impl ProjectConfig {
    /// Mode chosen by flags, environment or file, else `default`.
    pub fn mode(&self, default: BuildMode) -> BuildMode {
        self.config.mode_or(default)
    }

    /// Fold the transform profiles for `mode` into their options.
    pub fn materialize(&self, mode: BuildMode) -> Result<KilnConfig> {
        Ok(self.config.clone().materialize_mode(mode)?)
    }

    /// Config file path relative to the root, for display.
    pub fn source_display(&self) -> String {
        match &self.source {
            Some(path) => path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .display()
                .to_string(),
            None => "defaults".to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
