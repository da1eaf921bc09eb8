//! Post-processing of finished assets.
//!
//! The stage is active when the `optimize` override says so, or, with the
//! override unset, in production. Optimizers run in declaration order on each
//! asset whose filename passes their filter; different assets are processed
//! in parallel.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kiln_config::{BuildMode, OptimizerRef};
use rayon::prelude::*;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::output::Asset;
use crate::{Error, Result};

mod command;
mod css_minify;

pub use command::CommandOptimizer;
pub use css_minify::CssMinifier;

/// Per-call information available to an optimizer.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerContext<'a> {
    /// Asset filename relative to the output directory.
    pub filename: &'a str,
    pub root: &'a Path,
    pub mode: BuildMode,
}

/// A minifier or other whole-asset post-processor. Safe to call concurrently.
pub trait Optimizer: Send + Sync {
    fn optimize(
        &self,
        asset: &[u8],
        options: &Map<String, Value>,
        ctx: &OptimizerContext<'_>,
    ) -> anyhow::Result<Vec<u8>>;

    /// Filename regex used when the config gives no `test`.
    fn default_test(&self) -> Option<&'static str> {
        None
    }
}

#[derive(Clone, Default)]
pub struct OptimizerRegistry {
    optimizers: HashMap<String, Arc<dyn Optimizer>>,
}

impl OptimizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `css-minify` and `command`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("css-minify", CssMinifier);
        registry.register("command", CommandOptimizer);
        registry
    }

    pub fn register<O: Optimizer + 'static>(&mut self, id: impl Into<String>, optimizer: O) {
        self.optimizers.insert(id.into(), Arc::new(optimizer));
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Optimizer>> {
        self.optimizers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.optimizers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.optimizers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for OptimizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerRegistry")
            .field("optimizers", &self.ids())
            .finish()
    }
}

struct ResolvedOptimizer {
    id: String,
    options: Map<String, Value>,
    filter: Option<Regex>,
    optimizer: Arc<dyn Optimizer>,
}

impl ResolvedOptimizer {
    fn accepts(&self, filename: &str) -> bool {
        self.filter.as_ref().is_none_or(|re| re.is_match(filename))
    }
}

/// Ordered optimizers plus the activation override.
pub struct OptimizationStage {
    optimizers: Vec<ResolvedOptimizer>,
    force: Option<bool>,
}

impl OptimizationStage {
    /// Resolve `refs` against `registry`. Order is fixed from here on.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOptimizer`] or [`Error::InvalidPattern`] for a bad
    /// `test` regex.
    pub fn new(refs: &[OptimizerRef], force: Option<bool>, registry: &OptimizerRegistry) -> Result<Self> {
        let optimizers = refs
            .iter()
            .map(|r| {
                let optimizer = registry
                    .get(&r.optimizer)
                    .ok_or_else(|| Error::UnknownOptimizer(r.optimizer.clone()))?;
                let test = r.test.as_deref().or_else(|| optimizer.default_test());
                let filter = test
                    .map(|pattern| {
                        Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                            pattern: pattern.to_string(),
                            message: e.to_string(),
                        })
                    })
                    .transpose()?;
                Ok(ResolvedOptimizer {
                    id: r.optimizer.clone(),
                    options: r.options.clone(),
                    filter,
                    optimizer,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { optimizers, force })
    }

    /// Stage with no optimizers, active per `force`/mode.
    pub fn empty(force: Option<bool>) -> Self {
        Self {
            optimizers: Vec::new(),
            force,
        }
    }

    pub fn is_active(&self, mode: BuildMode) -> bool {
        self.force.unwrap_or_else(|| mode.optimizes_by_default())
    }

    pub fn len(&self) -> usize {
        self.optimizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.optimizers.is_empty()
    }

    /// Run the matching optimizers over one asset.
    ///
    /// Inactive, or active without optimizers, returns the asset unchanged.
    pub fn apply(&self, mut asset: Asset, mode: BuildMode, root: &Path) -> Result<Asset> {
        if !self.is_active(mode) || !asset.kind.is_optimizable() {
            return Ok(asset);
        }

        for resolved in self.optimizers.iter().filter(|o| o.accepts(&asset.filename)) {
            let ctx = OptimizerContext {
                filename: &asset.filename,
                root,
                mode,
            };
            let before = asset.content.len();
            let optimized = resolved
                .optimizer
                .optimize(&asset.content, &resolved.options, &ctx)
                .map_err(|cause| Error::Optimizer {
                    path: asset.filename.clone(),
                    optimizer: resolved.id.clone(),
                    cause,
                })?;
            debug!(
                asset = %asset.filename,
                optimizer = %resolved.id,
                before,
                after = optimized.len(),
                "optimized asset"
            );
            asset.content = optimized;
        }

        Ok(asset)
    }

    /// Optimize all assets in parallel.
    ///
    /// Failures are isolated per asset and all of them are returned, in asset
    /// order, instead of the first one.
    pub fn apply_all(
        &self,
        assets: Vec<Asset>,
        mode: BuildMode,
        root: &Path,
    ) -> std::result::Result<Vec<Asset>, Vec<Error>> {
        if !self.is_active(mode) || self.optimizers.is_empty() {
            return Ok(assets);
        }

        let results: Vec<Result<Asset>> = assets
            .into_par_iter()
            .map(|asset| self.apply(asset, mode, root))
            .collect();

        let mut optimized = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(asset) => optimized.push(asset),
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(optimized)
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for OptimizationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationStage")
            .field(
                "optimizers",
                &self.optimizers.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            )
            .field("force", &self.force)
            .finish()
    }
}
