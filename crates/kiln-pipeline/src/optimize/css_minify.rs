use serde_json::{Map, Value};

use super::{Optimizer, OptimizerContext};
use crate::transform::css::process_css;

/// `css-minify`: lightningcss minification of stylesheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinifier;

impl Optimizer for CssMinifier {
    fn optimize(
        &self,
        asset: &[u8],
        _options: &Map<String, Value>,
        ctx: &OptimizerContext<'_>,
    ) -> anyhow::Result<Vec<u8>> {
        let source = std::str::from_utf8(asset)
            .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {e}", ctx.filename))?;
        Ok(process_css(source, ctx.filename, true)?.into_bytes())
    }

    fn default_test(&self) -> Option<&'static str> {
        Some(r"\.css$")
    }
}
