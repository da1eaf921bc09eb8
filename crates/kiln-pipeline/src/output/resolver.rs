//! Mode-dependent output layout.

use std::path::{Path, PathBuf};

use kiln_config::{BuildMode, OutputDescriptor, OutputDescriptors};

/// Selects the active [`OutputDescriptor`] for a build mode.
///
/// Selection is a pure function of the mode; the descriptor is applied whole.
#[derive(Debug, Clone)]
pub struct OutputResolver {
    descriptors: OutputDescriptors,
    name: String,
}

impl OutputResolver {
    pub fn new(descriptors: OutputDescriptors, name: impl Into<String>) -> Self {
        Self {
            descriptors,
            name: name.into(),
        }
    }

    pub fn resolve(&self, mode: BuildMode) -> &OutputDescriptor {
        self.descriptors.for_mode(mode)
    }

    /// Script bundle filename with `[name]` filled in.
    pub fn bundle_filename(&self, mode: BuildMode) -> String {
        self.resolve(mode).render_filename(&self.name)
    }

    /// Extracted stylesheet filename with `[name]` filled in.
    pub fn extract_filename(&self, mode: BuildMode) -> String {
        self.resolve(mode).render_extract_filename(&self.name)
    }

    /// Output directory for `mode`, anchored at `root` when relative.
    pub fn output_dir(&self, root: &Path, mode: BuildMode) -> PathBuf {
        root.join(&self.resolve(mode).path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_pure_and_mode_specific() {
        let resolver = OutputResolver::new(OutputDescriptors::default(), "app");

        let first = resolver.resolve(BuildMode::Production).clone();
        let second = resolver.resolve(BuildMode::Production).clone();
        assert_eq!(first, second);

        let dev = resolver.resolve(BuildMode::Development);
        assert!(dev.path != first.path || dev.public_path != first.public_path);
    }

    #[test]
    fn filenames_substitute_bundle_name() {
        let resolver = OutputResolver::new(OutputDescriptors::default(), "site");

        assert_eq!(resolver.bundle_filename(BuildMode::Development), "js/site.js");
        assert_eq!(resolver.bundle_filename(BuildMode::Production), "site.js");
        assert_eq!(resolver.extract_filename(BuildMode::Production), "css/site.css");
    }

    #[test]
    fn output_dir_is_root_relative() {
        let resolver = OutputResolver::new(OutputDescriptors::default(), "app");
        assert_eq!(
            resolver.output_dir(Path::new("/project"), BuildMode::Production),
            PathBuf::from("/project/dist")
        );
    }
}
