//! Per-mode output descriptors and static copy patterns.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mode::BuildMode;

/// Placeholder replaced by the bundle name in filename templates.
pub const NAME_PLACEHOLDER: &str = "[name]";

/// Where one build mode puts its artifacts and how they are addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputDescriptor {
    /// Script bundle filename template, relative to `path`.
    pub filename: String,

    /// Filename template for extracted stylesheets.
    #[serde(default = "default_extract_filename")]
    pub extract_filename: String,

    /// Base directory, relative to the project root.
    pub path: PathBuf,

    /// URL prefix under which the artifacts are served.
    pub public_path: String,
}

impl OutputDescriptor {
    pub fn development() -> Self {
        Self {
            filename: "js/[name].js".into(),
            extract_filename: default_extract_filename(),
            path: PathBuf::from("public"),
            public_path: "http://localhost:8080/public".into(),
        }
    }

    pub fn production() -> Self {
        Self {
            filename: "[name].js".into(),
            extract_filename: default_extract_filename(),
            path: PathBuf::from("dist"),
            public_path: "/".into(),
        }
    }

    pub fn render_filename(&self, name: &str) -> String {
        self.filename.replace(NAME_PLACEHOLDER, name)
    }

    pub fn render_extract_filename(&self, name: &str) -> String {
        self.extract_filename.replace(NAME_PLACEHOLDER, name)
    }
}

/// The development and production descriptors. Exactly one is active per build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputDescriptors {
    #[serde(default = "OutputDescriptor::development")]
    pub development: OutputDescriptor,

    #[serde(default = "OutputDescriptor::production")]
    pub production: OutputDescriptor,
}

impl Default for OutputDescriptors {
    fn default() -> Self {
        Self {
            development: OutputDescriptor::development(),
            production: OutputDescriptor::production(),
        }
    }
}

impl OutputDescriptors {
    pub fn for_mode(&self, mode: BuildMode) -> &OutputDescriptor {
        match mode {
            BuildMode::Development => &self.development,
            BuildMode::Production => &self.production,
        }
    }

    pub fn for_mode_mut(&mut self, mode: BuildMode) -> &mut OutputDescriptor {
        match mode {
            BuildMode::Development => &mut self.development,
            BuildMode::Production => &mut self.production,
        }
    }
}

/// Copies every file below `from` into `to` inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyPattern {
    pub from: PathBuf,

    #[serde(default = "default_copy_to")]
    pub to: PathBuf,
}

impl CopyPattern {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

fn default_extract_filename() -> String {
    "css/[name].css".into()
}

fn default_copy_to() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_name_placeholder() {
        let dev = OutputDescriptor::development();
        assert_eq!(dev.render_filename("app"), "js/app.js");
        assert_eq!(dev.render_extract_filename("app"), "css/app.css");

        let prod = OutputDescriptor::production();
        assert_eq!(prod.render_filename("site"), "site.js");
    }

    #[test]
    fn selects_descriptor_by_mode() {
        let descriptors = OutputDescriptors::default();
        assert_eq!(
            descriptors.for_mode(BuildMode::Development).path,
            PathBuf::from("public")
        );
        assert_eq!(
            descriptors.for_mode(BuildMode::Production).path,
            PathBuf::from("dist")
        );
    }

    #[test]
    fn partial_descriptors_fill_defaults() {
        let descriptors: OutputDescriptors = serde_json::from_str(
            r#"{ "production": { "filename": "app.js", "path": "../priv/static/js", "publicPath": "/" } }"#,
        )
        .unwrap();

        assert_eq!(descriptors.production.extract_filename, "css/[name].css");
        assert_eq!(descriptors.development, OutputDescriptor::development());
    }
}
