//! `kiln check`: validate configuration without building.

use crate::cli::CheckArgs;
use crate::config::{CliOverrides, ProjectConfig};
use crate::error::Result;
use crate::ui;
use kiln_config::{BuildMode, ConfigError, KilnConfig, validate_fs};
use kiln_pipeline::{
    EntryResolver, OptimizationStage, OptimizerRegistry, OutputResolver, RuleEngine,
    TransformRegistry,
};
use std::path::Path;

/// Execute the check command.
///
/// With `--schema`, prints the configuration JSON schema to stdout and
/// returns. Otherwise loads the project and, for each checked mode:
///
/// 1. compiles every rule pattern and looks up every loader
/// 2. looks up every optimizer and compiles its filter
/// 3. validates the schema and the filesystem (entries, copy sources)
/// 4. resolves the entry manifest
///
/// # Errors
///
/// Returns the first problem found. A project with no config file at all is
/// reported as [`ConfigError::NotFound`].
pub async fn execute(args: CheckArgs) -> Result<()> {
    if args.schema {
        println!("{}", serde_json::to_string_pretty(&KilnConfig::json_schema())?);
        return Ok(());
    }

    let overrides = CliOverrides {
        mode: args.mode.map(Into::into),
        ..Default::default()
    };
    let project = ProjectConfig::load(&args.project, &overrides)?;
    if project.source.is_none() {
        return Err(ConfigError::NotFound.into());
    }
    ui::info(&format!("Checking {}", project.source_display()));

    let modes: Vec<BuildMode> = match args.mode {
        Some(mode) => vec![mode.into()],
        None => BuildMode::ALL.to_vec(),
    };

    let transforms = TransformRegistry::with_builtins();
    let optimizers = OptimizerRegistry::with_builtins();

    for mode in modes {
        let config = project.materialize(mode)?;
        let summary = check_mode(&project.root, &config, mode, &transforms, &optimizers)?;
        ui::success(&summary);
        if args.print_config {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    ui::success("Configuration is valid");
    Ok(())
}

/// Validate one materialized configuration and describe what a build would do.
pub fn check_mode(
    root: &Path,
    config: &KilnConfig,
    mode: BuildMode,
    transforms: &TransformRegistry,
    optimizers: &OptimizerRegistry,
) -> Result<String> {
    let engine = RuleEngine::compile(&config.rules)?;
    engine.check_loaders(transforms)?;
    let stage = OptimizationStage::new(&config.optimizers, config.optimize, optimizers)?;
    validate_fs(config, root)?;

    let manifest =
        EntryResolver::new(root).resolve(&config.glob_patterns, &config.explicit_entries)?;
    let resolver = OutputResolver::new(config.output.clone(), config.name.clone());
    let output_dir = resolver.resolve(mode).path.display().to_string();

    let optimization = if stage.is_active(mode) {
        format!("{} optimizer(s) active", stage.len())
    } else {
        "optimization off".to_string()
    };

    Ok(format!(
        "{}: {} entries, {} rules, {}, output {}/{}",
        mode,
        manifest.len(),
        engine.len(),
        optimization,
        output_dir,
        resolver.bundle_filename(mode)
    ))
}
