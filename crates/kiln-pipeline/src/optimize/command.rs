use serde_json::{Map, Value};

use super::{Optimizer, OptimizerContext};
use crate::process::CommandSpec;

/// `command`: external minifier reading stdin and writing stdout, e.g. terser.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptimizer;

impl Optimizer for CommandOptimizer {
    fn optimize(
        &self,
        asset: &[u8],
        options: &Map<String, Value>,
        ctx: &OptimizerContext<'_>,
    ) -> anyhow::Result<Vec<u8>> {
        CommandSpec::from_options(options, ctx.root)?.run(asset, None)
    }

    fn default_test(&self) -> Option<&'static str> {
        Some(r"\.m?js$")
    }
}
