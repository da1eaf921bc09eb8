use serde_json::{Map, Value};

use super::{Transform, TransformContext, TransformOutput};

/// Diverts its input to the extracted stylesheet.
///
/// Declared first in a chain so it runs last, after the loaders that produce
/// the final CSS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractLoader;

impl Transform for ExtractLoader {
    fn invoke(
        &self,
        source: &[u8],
        _options: &Map<String, Value>,
        _ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        Ok(TransformOutput::Extract(source.to_vec()))
    }
}
