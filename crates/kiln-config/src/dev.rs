//! Development server configuration types.

use std::path::PathBuf;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `devServer` section. Only read when building in development mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevServerConfig {
    /// Extra response headers, sent in declaration order on every response.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// URL prefix the in-memory bundle is served under.
    #[serde(default = "default_public_path")]
    pub public_path: String,

    #[serde(default = "default_true")]
    pub watch: bool,

    /// Show an error page instead of the app while the last build is failing.
    #[serde(default = "default_true")]
    pub overlay: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Also write dev artifacts to the development output directory.
    #[serde(default)]
    pub write_to_disk: bool,

    /// Directory served as static fallback. Defaults to the project root.
    #[serde(default)]
    pub content_base: Option<PathBuf>,

    /// Additional path fragments the watcher ignores.
    #[serde(default)]
    pub watch_ignore: Vec<String>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            headers: IndexMap::new(),
            public_path: default_public_path(),
            watch: true,
            overlay: true,
            host: default_host(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            write_to_disk: false,
            content_base: None,
            watch_ignore: Vec::new(),
        }
    }
}

impl DevServerConfig {
    /// Public path without a trailing slash, `""` for the root.
    pub fn mount_prefix(&self) -> &str {
        self.public_path.trim_end_matches('/')
    }

    /// URL path under which `filename` is served.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.mount_prefix(), filename.trim_start_matches('/'))
    }
}

fn default_public_path() -> String {
    "/public".into()
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_debounce_ms() -> u64 {
    100
}
