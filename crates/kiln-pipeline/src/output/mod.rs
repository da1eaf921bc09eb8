//! Build artifacts, output layout and writing.

pub mod resolver;
pub mod writer;

pub use resolver::OutputResolver;
pub use writer::write_assets;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// The concatenated script bundle.
    Script,
    /// The extracted stylesheet.
    Stylesheet,
    /// A file copied verbatim from a copy pattern.
    Static,
}

impl AssetKind {
    /// Only generated assets go through the optimizers.
    pub fn is_optimizable(self) -> bool {
        !matches!(self, AssetKind::Static)
    }

    pub fn content_type(self, filename: &str) -> &'static str {
        match self {
            AssetKind::Script => "application/javascript; charset=utf-8",
            AssetKind::Stylesheet => "text/css; charset=utf-8",
            AssetKind::Static => content_type_for(filename),
        }
    }
}

/// A finished artifact, addressed relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// `/`-separated path relative to the output directory.
    pub filename: String,
    pub kind: AssetKind,
    pub content: Vec<u8>,
}

impl Asset {
    pub fn new(filename: impl Into<String>, kind: AssetKind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            kind,
            content: content.into(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.kind.content_type(&self.filename)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
