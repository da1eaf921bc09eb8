#![cfg_attr(docsrs, feature(doc_cfg))]

//! # kiln-pipeline
//!
//! Rule-based transform pipeline for front-end assets.
//!
//! A build resolves an ordered entry manifest, routes every file through the
//! transform chain its rules select, concatenates the results into a script
//! bundle plus an extracted stylesheet, optionally runs optimizers, and writes
//! the artifacts into the output directory chosen by the build mode.
//!
//! ```no_run
//! use kiln_config::{BuildMode, ConfigDiscovery};
//! use kiln_pipeline::Builder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigDiscovery::new("assets").load()?;
//! let result = Builder::new(config, "assets", BuildMode::Production)
//!     .write_to_disk(true)
//!     .build()?;
//!
//! for asset in &result.assets {
//!     println!("{} ({} bytes)", asset.filename, asset.content.len());
//! }
//! # Ok(()) }
//! ```

use std::path::PathBuf;

use kiln_config::ConfigError;

pub mod build;
pub mod cancel;
pub mod copy;
pub mod entry;
pub mod optimize;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod rules;
pub mod transform;

pub use build::{BuildOutcome, BuildResult, Builder};
pub use cancel::CancelToken;
pub use entry::{EntryManifest, EntryResolver};
pub use optimize::{OptimizationStage, Optimizer, OptimizerContext, OptimizerRegistry};
pub use output::{Asset, AssetKind, OutputResolver, write_assets};
pub use pipeline::{PipelineContext, PipelineOutput, TransformPipeline};
pub use rules::{ChainLink, RuleEngine, TransformChain};
pub use transform::{Transform, TransformContext, TransformOutput, TransformRegistry};

// Re-export the configuration model so callers need a single dependency
pub use kiln_config::{BuildMode, KilnConfig, OutputDescriptor};

/// Error types for kiln-pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither glob patterns nor explicit entries produced a file.
    #[error("no entries: glob patterns and explicit entries matched nothing")]
    NoEntries,

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("entry not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown loader '{0}'")]
    UnknownLoader(String),

    #[error("unknown optimizer '{0}'")]
    UnknownOptimizer(String),

    /// A transform failed for one file. Other files are unaffected.
    #[error("{stage} failed for {}: {cause}", path.display())]
    Transform {
        path: PathBuf,
        stage: String,
        #[source]
        cause: anyhow::Error,
    },

    /// An optimizer failed on a finished asset. Fails the whole build.
    #[error("optimizer '{optimizer}' failed on {path}: {cause}")]
    Optimizer {
        path: String,
        optimizer: String,
        #[source]
        cause: anyhow::Error,
    },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("failed to write {}: {message}", path.display())]
    OutputWrite { path: PathBuf, message: String },

    /// The build was superseded before it finished.
    #[error("build cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for kiln-pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Path the error is attributed to, if any.
    pub fn path(&self) -> Option<String> {
        match self {
            Error::EntryNotFound(path) | Error::Transform { path, .. } => {
                Some(path.display().to_string())
            }
            Error::OutputWrite { path, .. } => Some(path.display().to_string()),
            Error::Optimizer { path, .. } => Some(path.clone()),
            _ => None,
        }
    }

    /// Whether this error is confined to a single file or asset.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Error::Transform { .. } | Error::Optimizer { .. })
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoEntries => Error::NoEntries,
            ConfigError::EntryNotFound { path } => Error::EntryNotFound(path),
            ConfigError::Io(io) => Error::Io(io),
            other => Error::InvalidConfig(other.to_string()),
        }
    }
}

/// Renders a relative path with `/` separators, the form rules match against.
pub(crate) fn slash_path(path: &std::path::Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
