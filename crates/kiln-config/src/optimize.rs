//! Optimizer references.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Names a post-processing optimizer (minifier) and its options.
///
/// `test` narrows which finished assets the optimizer sees; when unset the
/// optimizer's own default filter applies.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerRef {
    pub optimizer: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
}

impl OptimizerRef {
    pub fn new(optimizer: impl Into<String>) -> Self {
        Self {
            optimizer: optimizer.into(),
            options: Map::new(),
            test: None,
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn test(mut self, pattern: impl Into<String>) -> Self {
        self.test = Some(pattern.into());
        self
    }
}

impl<'de> Deserialize<'de> for OptimizerRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full {
                optimizer: String,
                #[serde(default)]
                options: Map<String, Value>,
                #[serde(default)]
                test: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(optimizer) => OptimizerRef::new(optimizer),
            Repr::Full {
                optimizer,
                options,
                test,
            } => OptimizerRef {
                optimizer,
                options,
                test,
            },
        })
    }
}
