//! Command-line interface definition for kiln.
//!
//! # Command Structure
//!
//! - `kiln build` - run the pipeline once and write artifacts
//! - `kiln dev` - serve artifacts from memory, rebuild on change
//! - `kiln check` - validate configuration, or print its JSON schema
//! - `kiln init` - write a starter configuration

mod commands;
pub mod enums;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, DevArgs, InitArgs, ProjectArgs};
pub use enums::*;

/// kiln - a rule-based front-end asset pipeline
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "A rule-based front-end asset pipeline",
    long_about = "kiln routes source files through transform chains selected by file-type rules,\n\
                  writes mode-specific output, and serves development builds with live reload."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows which rules matched each file and every transform that ran.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
