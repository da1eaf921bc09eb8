//! kiln CLI - builds and serves front-end assets.
//!
//! The binary wraps `kiln-pipeline` with configuration layering, a terminal
//! UI, and a development server with live reload.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `build`, `dev`, `check` and `init`
//! - [`config`] - figment layering of defaults, config file, environment and flags
//! - [`dev`] - watcher, rebuild runner and HTTP server
//! - [`error`] - CLI error type and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and build summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
