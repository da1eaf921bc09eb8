use serde_json::{Map, Value};

use super::{Transform, TransformContext, TransformOutput};
use crate::process::CommandSpec;

/// Pipes the source through an external compiler.
///
/// See [`crate::process`] for the options it understands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLoader;

impl Transform for CommandLoader {
    fn invoke(
        &self,
        source: &[u8],
        options: &Map<String, Value>,
        ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        let spec = CommandSpec::from_options(options, ctx.root)?;
        let output = spec.run(source, Some(&ctx.absolute_path()))?;
        Ok(TransformOutput::Content(output))
    }
}
