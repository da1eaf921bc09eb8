//! `kiln build`: run the pipeline once and write the artifacts.

use crate::cli::BuildArgs;
use crate::config::{CliOverrides, ProjectConfig};
use crate::error::{CliError, Result};
use crate::ui;
use kiln_pipeline::{BuildMode, BuildOutcome, BuildResult, Builder};

/// Execute the build command.
///
/// Loads the layered configuration, builds in the selected mode (production
/// unless a flag, `KILN_MODE` or the config file says otherwise), writes the
/// artifacts and prints a summary.
///
/// # Errors
///
/// Resolution errors are returned as-is. A build that ran but left any file
/// failing returns [`CliError::BuildFailed`], so the exit code is non-zero
/// for both partial and failed outcomes.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let overrides = CliOverrides {
        mode: args.mode.map(Into::into),
        name: args.name.clone(),
        optimize: args.optimize_override(),
        dev_server: None,
    };
    let project = ProjectConfig::load(&args.project, &overrides)?;
    if project.source.is_none() {
        ui::warning("No config file found; using defaults and KILN_* environment");
    }

    let mode = project.mode(BuildMode::Production);
    ui::info(&format!(
        "Building '{}' in {} mode ({})",
        project.config.name,
        mode,
        project.source_display()
    ));

    let result = run(&project, mode).await?;
    report(&result)
}

/// Build `project` in `mode` on the blocking pool and write the artifacts.
pub async fn run(project: &ProjectConfig, mode: BuildMode) -> Result<BuildResult> {
    let builder =
        Builder::new(project.config.clone(), project.root.clone(), mode).write_to_disk(true);

    tokio::task::spawn_blocking(move || builder.build())
        .await
        .map_err(|e| CliError::Custom(format!("build task failed: {e}")))?
        .map_err(CliError::from)
}

/// Print errors and the summary, and turn the outcome into an exit status.
pub fn report(result: &BuildResult) -> Result<()> {
    for path in &result.discarded {
        ui::warning(&format!(
            "{} disappeared during the build and was skipped",
            path.display()
        ));
    }
    ui::print_build_errors(&result.errors);
    ui::print_build_summary(result);

    match result.outcome {
        BuildOutcome::Success => {
            ui::success(&format!(
                "Build completed in {}",
                ui::format_duration(result.duration)
            ));
            Ok(())
        }
        outcome => Err(CliError::BuildFailed {
            outcome,
            errors: result.errors.len(),
        }),
    }
}
