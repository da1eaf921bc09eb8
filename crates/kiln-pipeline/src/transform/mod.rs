//! Transform collaborators and their registry.
//!
//! A transform is a black box from bytes to bytes. Loaders named in rules are
//! looked up here by identifier; unknown identifiers are rejected before any
//! file is read.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kiln_config::BuildMode;
use serde_json::{Map, Value};

mod command;
pub(crate) mod css;
mod extract;
mod raw;

pub use command::CommandLoader;
pub use css::CssLoader;
pub use extract::ExtractLoader;
pub use raw::RawLoader;

/// What a single transform produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutput {
    /// Content handed to the next link, or to the bundle after the last one.
    Content(Vec<u8>),
    /// Content diverted to the extracted asset. Ends the chain.
    Extract(Vec<u8>),
}

/// Per-call information available to a transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Source file relative to `root`.
    pub path: &'a Path,
    pub root: &'a Path,
    pub mode: BuildMode,
}

impl TransformContext<'_> {
    pub fn absolute_path(&self) -> std::path::PathBuf {
        self.root.join(self.path)
    }
}

/// A content transform (compiler, transpiler, loader).
///
/// Implementations are stateless per call and may be invoked concurrently for
/// different files.
pub trait Transform: Send + Sync {
    fn invoke(
        &self,
        source: &[u8],
        options: &Map<String, Value>,
        ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput>;
}

/// Maps loader identifiers to transform implementations.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    loaders: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `css-loader`, `extract` (alias `mini-css-extract`),
    /// `command` and `raw`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("css-loader", CssLoader);
        registry.register("extract", ExtractLoader);
        registry.register("mini-css-extract", ExtractLoader);
        registry.register("command", CommandLoader);
        registry.register("raw", RawLoader);
        registry
    }

    /// Register `transform` under `id`, replacing any previous entry.
    pub fn register<T: Transform + 'static>(&mut self, id: impl Into<String>, transform: T) {
        self.loaders.insert(id.into(), Arc::new(transform));
    }

    pub fn register_shared(&mut self, id: impl Into<String>, transform: Arc<dyn Transform>) {
        self.loaders.insert(id.into(), transform);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Transform>> {
        self.loaders.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.loaders.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.loaders.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("loaders", &self.ids())
            .finish()
    }
}

/// Decode transform input as UTF-8.
pub(crate) fn source_text<'a>(source: &'a [u8], ctx: &TransformContext<'_>) -> anyhow::Result<&'a str> {
    std::str::from_utf8(source)
        .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {e}", ctx.path.display()))
}
