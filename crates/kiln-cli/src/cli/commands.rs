use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::*;

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the pipeline once and write the artifacts
    ///
    /// Resolves entries, runs each file's transform chain, optimizes when
    /// the mode calls for it, and writes to the mode's output directory.
    /// Exits non-zero unless every file built cleanly.
    Build(BuildArgs),

    /// Serve development builds with live reload
    ///
    /// Builds in memory, serves artifacts under the dev server's public
    /// path, and rebuilds when watched files change.
    Dev(DevArgs),

    /// Validate configuration
    ///
    /// Checks the config for schema and filesystem errors, and that every
    /// loader and optimizer it names is registered.
    Check(CheckArgs),

    /// Write a starter kiln.config.json
    Init(InitArgs),
}

/// Options shared by every command that loads a project.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root. Entries, rules and output paths resolve against it.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Explicit config file instead of discovery
    ///
    /// Discovery looks for kiln.toml, kiln.config.json, then the "kiln"
    /// field of package.json in the project root.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Build mode (defaults to production)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Run optimizers regardless of mode
    #[arg(long, conflicts_with = "no_optimize")]
    pub optimize: bool,

    /// Skip optimizers regardless of mode
    #[arg(long)]
    pub no_optimize: bool,

    /// Bundle name substituted for [name] in output filenames
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

impl BuildArgs {
    /// The `optimize` override implied by the flags, if any.
    pub fn optimize_override(&self) -> Option<bool> {
        if self.optimize {
            Some(true)
        } else if self.no_optimize {
            Some(false)
        } else {
            None
        }
    }
}

/// Arguments for the dev command
#[derive(Args, Debug, Clone)]
pub struct DevArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Build mode. Only development is accepted.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Address to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Build once and serve without watching for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Return 503 for failed builds instead of the error overlay
    #[arg(long)]
    pub no_overlay: bool,

    /// Also write artifacts to the development output directory
    #[arg(long)]
    pub write_to_disk: bool,

    /// Open the browser once the server is up
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Check a single mode instead of both
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    pub schema: bool,

    /// Print the resolved configuration for each checked mode
    #[arg(long)]
    pub print_config: bool,
}

/// Arguments for the init command
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Directory to write kiln.config.json into
    #[arg(default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Overwrite an existing kiln.config.json
    #[arg(short, long)]
    pub force: bool,
}
