// src/system/install_check.rs

use crate::{constants::DEPENDENCY_MARKERS, core::builder::InstallationChecker};
use std::path::Path;

/// Looks for dependency-install directories in the workspace root.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsInstallationChecker;

impl InstallationChecker for FsInstallationChecker {
    fn has_installed_dependencies(&self, base_path: &Path) -> bool {
        let found = DEPENDENCY_MARKERS
            .iter()
            .find(|marker| base_path.join(marker).is_dir());
        log::debug!(
            "Dependency marker in '{}': {:?}",
            base_path.display(),
            found
        );
        found.is_some()
    }
}
