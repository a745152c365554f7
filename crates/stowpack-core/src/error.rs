use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while placing a package.
///
/// Validation errors (`MalformedName`, `InvalidConfigFile`,
/// `UnsupportedPackageType`) and filesystem errors abort the current
/// transition and propagate to the host. Registration and manifest failures
/// are downgraded to logged warnings by the entry points.
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("package name '{0}' is malformed or cannot be parsed; expected vendor/name")]
    MalformedName(String),

    #[error("invalid package config ({source_label}): {detail}")]
    InvalidConfigFile { source_label: String, detail: String },

    #[error("package type '{0}' is not supported by this installer")]
    UnsupportedPackageType(String),

    #[error("failed to create installation path {}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create symlink {}", .link.display())]
    SymlinkCreateFailed {
        link: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove symlink {}", .link.display())]
    SymlinkRemoveFailed {
        link: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write package manifest {}", .path.display())]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("registration store failure: {detail}")]
    RegistrationFailed { detail: String },

    #[error("this installer cannot be used on a managed host; marker present: {}", .0.display())]
    UnsupportedEnvironment(PathBuf),
}
