use serde_json::{Map, Value};

use super::{Transform, TransformContext, TransformOutput};

/// Identity loader for rules that only mark files as passthrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawLoader;

impl Transform for RawLoader {
    fn invoke(
        &self,
        source: &[u8],
        _options: &Map<String, Value>,
        _ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        Ok(TransformOutput::Content(source.to_vec()))
    }
}
