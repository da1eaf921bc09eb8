//! Build orchestration.
//!
//! One [`Builder::build`] call runs the whole pipeline for one mode:
//!
//! 1. materialize and validate the configuration, compile rules, resolve
//!    loaders and optimizers against the registries
//! 2. resolve the entry manifest
//! 3. read and transform every entry in parallel
//! 4. concatenate module output into the bundle, extracted output into the
//!    stylesheet, and collect static copies
//! 5. optimize (when active) and write (when requested)
//!
//! Resolution problems are returned as `Err`. Per-file transform failures are
//! collected in [`BuildResult::errors`] while the other files proceed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kiln_config::{BuildMode, KilnConfig, OutputDescriptor, validate_schema};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::copy::collect_static;
use crate::entry::{EntryManifest, EntryResolver};
use crate::optimize::{OptimizationStage, OptimizerRegistry};
use crate::output::{Asset, AssetKind, OutputResolver, write_assets};
use crate::pipeline::{PipelineContext, PipelineOutput, TransformPipeline};
use crate::rules::RuleEngine;
use crate::transform::TransformRegistry;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOutcome {
    /// Every file transformed and every optimizer succeeded.
    Success,
    /// Some files failed; the rest produced output.
    Partial,
    /// Nothing usable was produced.
    Failed,
}

impl BuildOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildOutcome::Success => "success",
            BuildOutcome::Partial => "partial",
            BuildOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub mode: BuildMode,
    pub descriptor: OutputDescriptor,
    /// Absolute output directory of the active descriptor.
    pub output_dir: PathBuf,
    pub manifest: EntryManifest,
    pub assets: Vec<Asset>,
    /// Per-file failures in manifest order (optimizer failures in asset order).
    pub errors: Vec<Error>,
    /// Entries that disappeared between resolution and reading.
    pub discarded: Vec<PathBuf>,
    pub outcome: BuildOutcome,
    pub optimized: bool,
    pub written: bool,
    pub duration: Duration,
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        self.outcome == BuildOutcome::Success
    }

    pub fn asset(&self, filename: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.filename == filename)
    }

    pub fn total_size(&self) -> usize {
        self.assets.iter().map(Asset::size).sum()
    }
}

/// Runs builds for one project root and mode.
///
/// ```no_run
/// use kiln_config::{BuildMode, KilnConfig};
/// use kiln_pipeline::Builder;
///
/// # fn main() -> kiln_pipeline::Result<()> {
/// let mut config = KilnConfig::default();
/// config.explicit_entries = vec!["js/app.js".into()];
///
/// let result = Builder::new(config, ".", BuildMode::Development).build()?;
/// println!("{:?}", result.outcome);
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    config: KilnConfig,
    root: PathBuf,
    mode: BuildMode,
    transforms: Arc<TransformRegistry>,
    optimizers: Arc<OptimizerRegistry>,
    write: bool,
    cancel: CancelToken,
}

/// Outcome of reading and transforming one manifest entry.
enum FileResult {
    Output(PipelineOutput),
    Discarded,
    Failed(Error),
}

impl Builder {
    pub fn new(config: KilnConfig, root: impl Into<PathBuf>, mode: BuildMode) -> Self {
        Self {
            config,
            root: root.into(),
            mode,
            transforms: Arc::new(TransformRegistry::with_builtins()),
            optimizers: Arc::new(OptimizerRegistry::with_builtins()),
            write: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn transforms(mut self, registry: impl Into<Arc<TransformRegistry>>) -> Self {
        self.transforms = registry.into();
        self
    }

    pub fn optimizers(mut self, registry: impl Into<Arc<OptimizerRegistry>>) -> Self {
        self.optimizers = registry.into();
        self
    }

    /// Write artifacts to the active output directory after a build.
    pub fn write_to_disk(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// # Errors
    ///
    /// Resolution errors ([`Error::NoEntries`], [`Error::InvalidPattern`],
    /// [`Error::EntryNotFound`], [`Error::UnknownLoader`],
    /// [`Error::UnknownOptimizer`], [`Error::InvalidConfig`]), write errors,
    /// and [`Error::Cancelled`].
    pub fn build(&self) -> Result<BuildResult> {
        let started = Instant::now();
        let mode = self.mode;

        let config = self.config.clone().materialize_mode(mode)?;

        // Pattern and registry errors first, so they surface with their own variants.
        let engine = RuleEngine::compile(&config.rules)?;
        engine.check_loaders(&self.transforms)?;
        let stage = OptimizationStage::new(&config.optimizers, config.optimize, &self.optimizers)?;
        validate_schema(&config)?;
        let resolver = OutputResolver::new(config.output.clone(), config.name.clone());
        let descriptor = resolver.resolve(mode).clone();

        let manifest =
            EntryResolver::new(&self.root).resolve(&config.glob_patterns, &config.explicit_entries)?;
        self.cancel.check()?;

        debug!(
            mode = %mode,
            entries = manifest.len(),
            rules = engine.len(),
            "starting build"
        );

        let pipeline = TransformPipeline::new(&self.transforms);
        let ctx = PipelineContext {
            root: &self.root,
            mode,
            cancel: &self.cancel,
        };

        // par_iter + collect keeps manifest order.
        let results: Vec<FileResult> = manifest
            .entries()
            .par_iter()
            .map(|path| self.process_file(&pipeline, &engine, path, &ctx))
            .collect::<Result<_>>()?;

        let mut modules = Vec::new();
        let mut extracted = Vec::new();
        let mut errors = Vec::new();
        let mut discarded = Vec::new();
        for (path, result) in manifest.iter().zip(results) {
            match result {
                FileResult::Output(PipelineOutput::Module(bytes)) => modules.push(bytes),
                FileResult::Output(PipelineOutput::Extracted(bytes)) => extracted.push(bytes),
                FileResult::Discarded => discarded.push(path.clone()),
                FileResult::Failed(err) => errors.push(err),
            }
        }

        let produced_output = !modules.is_empty() || !extracted.is_empty();
        let mut assets = Vec::new();
        if !modules.is_empty() {
            assets.push(Asset::new(
                resolver.bundle_filename(mode),
                AssetKind::Script,
                concat(&modules),
            ));
        }
        if !extracted.is_empty() {
            assets.push(Asset::new(
                resolver.extract_filename(mode),
                AssetKind::Stylesheet,
                concat(&extracted),
            ));
        }
        assets.extend(collect_static(&self.root, &config.copy)?);

        self.cancel.check()?;

        let optimized = stage.is_active(mode) && !stage.is_empty();
        let assets = match stage.apply_all(assets, mode, &self.root) {
            Ok(assets) => assets,
            Err(optimizer_errors) => {
                errors.extend(optimizer_errors);
                Vec::new()
            }
        };

        self.cancel.check()?;

        let outcome = if errors.is_empty() {
            BuildOutcome::Success
        } else if produced_output && !assets.is_empty() {
            BuildOutcome::Partial
        } else {
            BuildOutcome::Failed
        };

        let output_dir = resolver.output_dir(&self.root, mode);
        let written = self.write && !assets.is_empty();
        if written {
            write_assets(&output_dir, &assets)?;
        }

        let duration = started.elapsed();
        info!(
            mode = %mode,
            outcome = outcome.as_str(),
            entries = manifest.len(),
            assets = assets.len(),
            errors = errors.len(),
            optimized,
            written,
            elapsed_ms = duration.as_millis() as u64,
            "build finished"
        );

        Ok(BuildResult {
            mode,
            descriptor,
            output_dir,
            manifest,
            assets,
            errors,
            discarded,
            outcome,
            optimized,
            written,
            duration,
        })
    }

    /// Read and transform one entry. Only cancellation escapes as `Err`.
    fn process_file(
        &self,
        pipeline: &TransformPipeline<'_>,
        engine: &RuleEngine,
        path: &Path,
        ctx: &PipelineContext<'_>,
    ) -> Result<FileResult> {
        self.cancel.check()?;

        let source = match std::fs::read(self.root.join(path)) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "entry disappeared during build, discarding");
                return Ok(FileResult::Discarded);
            }
            Err(err) => {
                return Ok(FileResult::Failed(Error::Transform {
                    path: path.to_path_buf(),
                    stage: "read".to_string(),
                    cause: err.into(),
                }));
            }
        };

        let chain = engine.rules_for(path);
        debug!(path = %path.display(), loaders = ?chain.loaders(), "resolved chain");

        match pipeline.run(path, source, &chain, ctx) {
            Ok(output) => Ok(FileResult::Output(output)),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err) => Ok(FileResult::Failed(err)),
        }
    }
}

/// Join module outputs, each terminated by a newline.
fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        out.extend_from_slice(part);
        if !part.ends_with(b"\n") {
            out.push(b'\n');
        }
    }
    out
}
