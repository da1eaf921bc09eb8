//! Build mode selection.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Development/production axis of a build.
///
/// Chosen once per build invocation. Output layout and whether optimizers run
/// are pure functions of this value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub const ALL: [BuildMode; 2] = [BuildMode::Development, BuildMode::Production];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, BuildMode::Production)
    }

    /// Whether optimizers run when the config leaves `optimize` unset.
    pub fn optimizes_by_default(self) -> bool {
        self.is_production()
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!(
                "Invalid build mode: '{}'. Expected: development, production",
                other
            )),
        }
    }
}
