//! Atomic, path-checked asset writing.
//!
//! Every asset is first written to a uniquely named temp file in its target
//! directory. Only after all temp files exist are they renamed over the final
//! paths, so a failed build never leaves a truncated artifact behind and two
//! concurrent writers of the same path cannot produce a torn file. Temp files
//! that were never persisted are removed when dropped.
//!
//! Filenames are normalized and must stay inside the output directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tempfile::NamedTempFile;
use tracing::debug;

use super::Asset;
use crate::{Error, Result};

/// Write `assets` below `dir`, creating directories as needed.
///
/// # Errors
///
/// - [`Error::InvalidOutputPath`] if a filename escapes `dir`
/// - [`Error::OutputWrite`] if creating, writing or renaming fails
///
/// ```no_run
/// use kiln_pipeline::{Asset, AssetKind, write_assets};
/// use std::path::Path;
///
/// # fn main() -> kiln_pipeline::Result<()> {
/// let bundle = Asset::new("js/app.js", AssetKind::Script, b"init();".to_vec());
/// write_assets(Path::new("public"), &[bundle])?;
/// # Ok(()) }
/// ```
pub fn write_assets(dir: &Path, assets: &[Asset]) -> Result<()> {
    let dir = validate_and_normalize_dir(dir)?;

    fs::create_dir_all(&dir).map_err(|e| Error::OutputWrite {
        path: dir.clone(),
        message: format!("failed to create output directory: {e}"),
    })?;

    let operations = assets
        .iter()
        .map(|asset| Ok((validate_output_path(&dir, &asset.filename)?, asset.content.as_slice())))
        .collect::<Result<Vec<_>>>()?;

    write_files_atomic(&operations)?;
    debug!(dir = %dir.display(), files = operations.len(), "wrote assets");
    Ok(())
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir()
        .map_err(|e| Error::InvalidOutputPath(format!("failed to get current directory: {e}")))?;
    Ok(cwd.join(cleaned).clean())
}

/// Resolve `filename` below `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(format!(
            "filename contains a null byte: {filename:?}"
        )));
    }

    if filename.trim().is_empty() {
        return Err(Error::InvalidOutputPath("empty filename".to_string()));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut staged = Vec::with_capacity(operations.len());

    // Phase 1: every file goes to a temp file next to its target.
    for (target, content) in operations {
        let parent = target.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| Error::OutputWrite {
            path: parent.to_path_buf(),
            message: format!("failed to create directory: {e}"),
        })?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::OutputWrite {
            path: target.clone(),
            message: format!("failed to create temp file: {e}"),
        })?;
        temp.write_all(content)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::OutputWrite {
                path: target.clone(),
                message: format!("failed to write temp file: {e}"),
            })?;

        staged.push((temp, target));
    }

    // Phase 2: rename over the final paths. Unpersisted temps are deleted on drop.
    for (temp, target) in staged {
        temp.persist(target).map_err(|e| Error::OutputWrite {
            path: target.clone(),
            message: format!("failed to rename into place: {}", e.error),
        })?;
    }

    Ok(())
}
