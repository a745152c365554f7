use std::fs;
use std::path::{Path, PathBuf};

use stowpack_core::{InstallerError, TypeRegistry};

/// Filesystem layout of one platform storage tree.
///
/// Installed content lives under `<root>/<typeSubPath>/<vendor>/<suffix>`;
/// published symlinks live under `<web_root>/<linkName>`; manifests under
/// `<root>/<typeSubPath>/.manifest/packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    web_root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>, web_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            web_root: web_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// The same layout with the storage root swapped, for packages that
    /// declare a `base-install-path` override.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> StorageLayout {
        StorageLayout {
            root: root.into(),
            web_root: self.web_root.clone(),
        }
    }

    pub fn type_dir(&self, sub_path: &str) -> PathBuf {
        self.root.join(trim_segment(sub_path))
    }

    pub fn package_dir(&self, sub_path: &str, vendor: &str, suffix: &str) -> PathBuf {
        self.type_dir(sub_path)
            .join(trim_segment(vendor))
            .join(trim_segment(suffix))
    }

    pub fn manifest_dir(&self, sub_path: &str) -> PathBuf {
        self.type_dir(sub_path).join(".manifest").join("packages")
    }

    pub fn manifest_path(&self, sub_path: &str, sanitized_unique_name: &str) -> PathBuf {
        self.manifest_dir(sub_path)
            .join(format!("{sanitized_unique_name}.json"))
    }

    pub fn link_path(&self, link_rel: &str) -> PathBuf {
        self.web_root.join(trim_segment(link_rel))
    }

    /// Creates the per-type manifest directories and the web root.
    pub fn ensure_tree(&self, types: &TypeRegistry) -> Result<(), InstallerError> {
        for (_, sub_path) in types.iter() {
            let dir = self.manifest_dir(sub_path);
            fs::create_dir_all(&dir).map_err(|source| InstallerError::DirectoryCreateFailed {
                path: dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&self.web_root).map_err(|source| {
            InstallerError::DirectoryCreateFailed {
                path: self.web_root.clone(),
                source,
            }
        })?;
        Ok(())
    }
}

/// Composes the absolute install path for a package and, when asked,
/// creates it with all missing parents. Re-running on an existing path is a
/// no-op success.
pub fn build_install_path(
    layout: &StorageLayout,
    sub_path: &str,
    vendor: &str,
    suffix: &str,
    create_if_missing: bool,
) -> Result<PathBuf, InstallerError> {
    let path = layout.package_dir(sub_path, vendor, suffix);
    if create_if_missing && !path.is_dir() {
        create_dir_tree(&path)?;
    }
    Ok(path)
}

fn create_dir_tree(path: &Path) -> Result<(), InstallerError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o775);
    }
    builder
        .create(path)
        .map_err(|source| InstallerError::DirectoryCreateFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Strips surrounding whitespace and redundant separators from one path
/// segment.
fn trim_segment(segment: &str) -> &str {
    segment.trim().trim_matches('/')
}
