//! Static file copying (`copy` patterns).

use std::path::{Path, PathBuf};

use kiln_config::CopyPattern;
use path_clean::PathClean;
use walkdir::WalkDir;

use crate::output::{Asset, AssetKind};
use crate::{Error, Result, slash_path};

/// Read every file below each pattern's `from` directory as a static asset
/// placed under `to`. Files come in lexical order per pattern.
///
/// A missing source directory is skipped with a warning so a fresh checkout
/// without `static/` still builds.
pub fn collect_static(root: &Path, patterns: &[CopyPattern]) -> Result<Vec<Asset>> {
    let mut assets = Vec::new();

    for pattern in patterns {
        let source = root.join(&pattern.from);
        if !source.is_dir() {
            tracing::warn!(from = %pattern.from.display(), "copy source is not a directory, skipping");
            continue;
        }

        for entry in WalkDir::new(&source).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("file system loop in copy source")),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&source).unwrap_or(entry.path());
            let target: PathBuf = pattern.to.join(relative).clean();
            let content = std::fs::read(entry.path())?;
            assets.push(Asset::new(slash_path(&target), AssetKind::Static, content));
        }
    }

    tracing::debug!(files = assets.len(), "collected static files");
    Ok(assets)
}
