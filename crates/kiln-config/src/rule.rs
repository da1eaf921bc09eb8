//! File-type rules and the transform references they carry.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::mode::BuildMode;
use crate::serde_helpers::one_or_many;

/// One entry of the `rules` list.
///
/// ```toml
/// [[rules]]
/// test = '\.elm$'
/// exclude = ['elm-stuff', 'node_modules']
/// use = { loader = "command", options = { binaryPath = "node_modules/.bin/elm" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Regular expression matched against the `/`-separated file path.
    pub test: String,

    /// Regular expressions that veto the rule even when `test` matches.
    #[serde(default, deserialize_with = "one_or_many")]
    #[schemars(with = "Vec<String>")]
    pub exclude: Vec<String>,

    /// Transform chain in declaration order. The last entry runs first.
    #[serde(rename = "use", deserialize_with = "one_or_many")]
    #[schemars(with = "Vec<TransformRef>")]
    pub chain: Vec<TransformRef>,
}

impl RuleConfig {
    pub fn new(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            exclude: Vec::new(),
            chain: Vec::new(),
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn with(mut self, transform: TransformRef) -> Self {
        self.chain.push(transform);
        self
    }
}

/// Names an external transform collaborator plus its options bag.
///
/// Accepts a bare string (`"css-loader"`) as shorthand for a reference without
/// options.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransformRef {
    pub loader: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,

    /// Per-mode option overrides, merged into `options` by
    /// [`crate::KilnConfig::materialize_mode`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<BuildMode, Map<String, Value>>,
}

impl TransformRef {
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: Map::new(),
            profiles: BTreeMap::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn profile_option(
        mut self,
        mode: BuildMode,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.profiles
            .entry(mode)
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

impl<'de> Deserialize<'de> for TransformRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full {
                loader: String,
                #[serde(default)]
                options: Map<String, Value>,
                #[serde(default)]
                profiles: BTreeMap<BuildMode, Map<String, Value>>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(loader) => TransformRef::new(loader),
            Repr::Full {
                loader,
                options,
                profiles,
            } => TransformRef {
                loader,
                options,
                profiles,
            },
        })
    }
}
