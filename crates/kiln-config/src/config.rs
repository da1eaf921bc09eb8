//! Top-level configuration and per-mode materialization.
//!
//! `KilnConfig` is the whole project declaration. Before a build it is
//! materialized for one [`BuildMode`], which folds every transform's
//! `profiles.<mode>` overrides into its `options`.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::dev::DevServerConfig;
use crate::error::{ConfigError, Result as ConfigResult};
use crate::mode::BuildMode;
use crate::optimize::OptimizerRef;
use crate::output::{CopyPattern, OutputDescriptors};
use crate::rule::{RuleConfig, TransformRef};

/// Default bundle name substituted for `[name]`.
pub const DEFAULT_NAME: &str = "app";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KilnConfig {
    /// Mode recorded in the file. Callers may override it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<BuildMode>,

    /// Bundle name, substituted for `[name]` in filename templates.
    #[serde(default = "default_name")]
    pub name: String,

    /// Glob patterns relative to the project root, expanded first.
    #[serde(default)]
    pub glob_patterns: Vec<String>,

    /// Entry files appended after glob matches.
    #[serde(default)]
    pub explicit_entries: Vec<PathBuf>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub output: OutputDescriptors,

    /// Optimizers in the order they run.
    #[serde(default)]
    pub optimizers: Vec<OptimizerRef>,

    /// Forces optimization on or off. Unset means "production only".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerConfig>,

    #[serde(default)]
    pub copy: Vec<CopyPattern>,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            mode: None,
            name: default_name(),
            glob_patterns: Vec::new(),
            explicit_entries: Vec::new(),
            rules: Vec::new(),
            output: OutputDescriptors::default(),
            optimizers: Vec::new(),
            optimize: None,
            dev_server: None,
            copy: Vec::new(),
        }
    }
}

impl KilnConfig {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::KilnConfig;
    /// use serde_json::json;
    ///
    /// let config = KilnConfig::from_value(json!({
    ///     "globPatterns": ["vendor/**/*.js"],
    ///     "explicitEntries": ["js/app.js"]
    /// }))
    /// .unwrap();
    /// assert_eq!(config.name, "app");
    /// assert_eq!(config.glob_patterns, vec!["vendor/**/*.js".to_string()]);
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Fold every transform's `profiles.<mode>` into its options and record
    /// the mode. Profiles are consumed so materializing twice is a no-op.
    pub fn materialize_mode(mut self, mode: BuildMode) -> ConfigResult<Self> {
        for rule in &mut self.rules {
            apply_transform_profiles(&mut rule.chain, mode)?;
        }
        self.mode = Some(mode);
        Ok(self)
    }

    /// Mode from the file, falling back to `fallback`.
    pub fn mode_or(&self, fallback: BuildMode) -> BuildMode {
        self.mode.unwrap_or(fallback)
    }

    pub fn dev_server_or_default(&self) -> DevServerConfig {
        self.dev_server.clone().unwrap_or_default()
    }

    /// Whether optimizers run for `mode` under the current override.
    pub fn optimization_active(&self, mode: BuildMode) -> bool {
        self.optimize.unwrap_or_else(|| mode.optimizes_by_default())
    }

    /// A starter configuration shaped like a typical Elm + CSS front end.
    pub fn example() -> Self {
        let value = json!({
            "name": "app",
            "globPatterns": ["vendor/**/*.js"],
            "explicitEntries": ["js/app.js"],
            "rules": [
                {
                    "test": "\\.elm$",
                    "exclude": ["elm-stuff", "node_modules"],
                    "use": {
                        "loader": "command",
                        "options": {
                            "binaryPath": "node_modules/.bin/elm-make-stdout",
                            "debugFlag": "--debug"
                        },
                        "profiles": { "development": { "debug": true } }
                    }
                },
                {
                    "test": "\\.js$",
                    "exclude": "node_modules",
                    "use": "raw"
                },
                {
                    "test": "\\.css$",
                    "use": ["extract", "css-loader"]
                }
            ],
            "optimizers": [
                { "optimizer": "command", "options": { "command": "terser", "args": ["--compress", "--mangle"] } },
                "css-minify"
            ],
            "devServer": {
                "headers": { "Access-Control-Allow-Origin": "*" },
                "publicPath": "/public"
            },
            "copy": [{ "from": "static", "to": "." }]
        });

        // Literal above always matches the model.
        serde_json::from_value(value).unwrap_or_default()
    }

    /// JSON schema of the configuration surface.
    pub fn json_schema() -> Value {
        schemars::schema_for!(KilnConfig).to_value()
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

/// Deep merge `update` into `target`. Objects merge key by key, anything else
/// (arrays included) replaces.
pub(crate) fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

fn apply_transform_profiles(chain: &mut [TransformRef], mode: BuildMode) -> ConfigResult<()> {
    for transform in chain {
        let overrides = transform.profiles.remove(&mode);
        transform.profiles.clear();

        let Some(overrides) = overrides else {
            continue;
        };

        let mut merged = Value::Object(std::mem::take(&mut transform.options));
        merge_values(&mut merged, &Value::Object(overrides));
        transform.options = match merged {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::InvalidProfileOverride {
                    message: format!(
                        "{} override for loader '{}' produced {other}, expected an object",
                        mode, transform.loader
                    ),
                });
            }
        };
    }

    Ok(())
}
