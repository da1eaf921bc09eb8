//! `kiln init`: write a starter configuration.

use crate::cli::InitArgs;
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use kiln_config::KilnConfig;
use std::fs;

/// File written by `kiln init`.
pub const INIT_FILE: &str = "kiln.config.json";

/// Execute the init command.
///
/// # Errors
///
/// Fails if the target directory does not exist, or if `kiln.config.json`
/// already exists and `--force` was not given.
pub async fn execute(args: InitArgs) -> Result<()> {
    if !args.dir.is_dir() {
        return Err(CliError::FileNotFound(args.dir));
    }

    let path = args.dir.join(INIT_FILE);
    if path.exists() && !args.force {
        return Err(CliError::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let mut content = serde_json::to_string_pretty(&KilnConfig::example())?;
    content.push('\n');
    fs::write(&path, content).with_path(&path)?;

    ui::success(&format!("Wrote {}", path.display()));
    ui::info("Next: adjust globPatterns and rules, then run 'kiln check'");
    Ok(())
}
