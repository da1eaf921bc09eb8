//! `css-loader`: parse and re-print CSS through lightningcss.

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use serde_json::{Map, Value};

use super::{Transform, TransformContext, TransformOutput, source_text};

/// Validates and normalizes CSS. Option `minify` (bool) also minifies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssLoader;

impl Transform for CssLoader {
    fn invoke(
        &self,
        source: &[u8],
        options: &Map<String, Value>,
        ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        let minify = options.get("minify").and_then(Value::as_bool).unwrap_or(false);
        let css = process_css(source_text(source, ctx)?, &ctx.path.to_string_lossy(), minify)?;
        Ok(TransformOutput::Content(css.into_bytes()))
    }
}

/// Parse, optionally minify, and print a stylesheet.
pub(crate) fn process_css(source: &str, filename: &str, minify: bool) -> anyhow::Result<String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..Default::default()
        },
    )
    .map_err(|e| anyhow::anyhow!("failed to parse CSS from {filename}: {e}"))?;

    if minify {
        stylesheet
            .minify(MinifyOptions::default())
            .map_err(|e| anyhow::anyhow!("failed to minify CSS from {filename}: {e}"))?;
    }

    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            ..Default::default()
        })
        .map_err(|e| anyhow::anyhow!("failed to print CSS from {filename}: {e}"))?;

    Ok(result.code)
}
