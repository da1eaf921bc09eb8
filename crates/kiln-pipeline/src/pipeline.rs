//! Chain execution for a single file.

use std::path::Path;

use kiln_config::BuildMode;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::rules::TransformChain;
use crate::transform::{TransformContext, TransformOutput, TransformRegistry};
use crate::{Error, Result};

/// Result of running one file through its chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutput {
    /// Goes into the script bundle.
    Module(Vec<u8>),
    /// Goes into the extracted stylesheet.
    Extracted(Vec<u8>),
}

impl PipelineOutput {
    pub fn bytes(&self) -> &[u8] {
        match self {
            PipelineOutput::Module(bytes) | PipelineOutput::Extracted(bytes) => bytes,
        }
    }
}

/// Shared per-build inputs for chain execution.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub root: &'a Path,
    pub mode: BuildMode,
    pub cancel: &'a CancelToken,
}

pub struct TransformPipeline<'a> {
    registry: &'a TransformRegistry,
}

impl<'a> TransformPipeline<'a> {
    pub fn new(registry: &'a TransformRegistry) -> Self {
        Self { registry }
    }

    /// Run `chain` over `source`, last-declared link first.
    ///
    /// An empty chain passes the source through unchanged. After a link
    /// extracts, no further link runs.
    ///
    /// # Errors
    ///
    /// [`Error::Transform`] naming the failing loader, or
    /// [`Error::Cancelled`] if the token fires between links.
    pub fn run(
        &self,
        path: &Path,
        source: Vec<u8>,
        chain: &TransformChain,
        ctx: &PipelineContext<'_>,
    ) -> Result<PipelineOutput> {
        let transform_ctx = TransformContext {
            path,
            root: ctx.root,
            mode: ctx.mode,
        };

        let mut current = source;
        for link in chain.execution_order() {
            ctx.cancel.check()?;

            let loader = link.loader();
            let transform = self.registry.get(loader).ok_or_else(|| Error::Transform {
                path: path.to_path_buf(),
                stage: loader.to_string(),
                cause: anyhow::anyhow!("loader '{loader}' is not registered"),
            })?;

            debug!(
                path = %path.display(),
                loader,
                rule = link.rule_index,
                position = link.position,
                "running transform"
            );

            let output = transform
                .invoke(&current, &link.transform.options, &transform_ctx)
                .map_err(|cause| Error::Transform {
                    path: path.to_path_buf(),
                    stage: loader.to_string(),
                    cause,
                })?;

            match output {
                TransformOutput::Content(bytes) => current = bytes,
                TransformOutput::Extract(bytes) => {
                    debug!(path = %path.display(), loader, "extracted");
                    return Ok(PipelineOutput::Extracted(bytes));
                }
            }
        }

        Ok(PipelineOutput::Module(current))
    }
}
