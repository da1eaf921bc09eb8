//! Configuration for the kiln asset pipeline.
//!
//! The value model here is what a project declares: entries, rules, per-mode
//! output descriptors, optimizers and the development server. Everything is
//! plain data; compiling rules and running transforms happens in
//! `kiln-pipeline`.

pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod mode;
pub mod optimize;
pub mod output;
pub mod rule;
pub mod validation;

mod serde_helpers;

// Re-export main types
pub use config::*;
pub use dev::*;
pub use error::*;
pub use mode::BuildMode;
pub use optimize::OptimizerRef;
pub use output::{CopyPattern, NAME_PLACEHOLDER, OutputDescriptor, OutputDescriptors};
pub use rule::{RuleConfig, TransformRef};

// Re-export discovery and validation
pub use discovery::{ConfigDiscovery, discover, discover_for_mode, load_from, read_value};
pub use validation::{validate_fs, validate_schema, ConfigValidator, FsValidator, SchemaValidator};
