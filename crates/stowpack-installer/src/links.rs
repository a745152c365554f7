use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stowpack_core::{InstallerError, LinkSpec, PackageDescriptor};
use tracing::{debug, warn};

use crate::layout::StorageLayout;

/// A normalized (target, link name) pair ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub target: PathBuf,
    pub link: PathBuf,
}

/// Normalizes the descriptor's link specs against the install path and the
/// web root, in declared order.
pub fn resolve_links(
    layout: &StorageLayout,
    install_path: &Path,
    descriptor: &PackageDescriptor,
) -> Vec<ResolvedLink> {
    descriptor
        .links()
        .iter()
        .map(|spec| resolve_link(layout, install_path, descriptor.suffix(), spec))
        .collect()
}

fn resolve_link(
    layout: &StorageLayout,
    install_path: &Path,
    suffix: &str,
    spec: &LinkSpec,
) -> ResolvedLink {
    let target = match spec
        .target
        .as_deref()
        .map(|rel| rel.trim().trim_matches('/'))
        .filter(|rel| !rel.is_empty())
    {
        Some(rel) => install_path.join(rel),
        None => install_path.to_path_buf(),
    };

    let link_rel = spec
        .link
        .as_deref()
        .map(|rel| rel.trim().trim_matches('/'))
        .filter(|rel| !rel.is_empty())
        .unwrap_or(suffix);

    ResolvedLink {
        target,
        link: layout.link_path(link_rel),
    }
}

/// Creates the given links in order.
///
/// An existing symlink that already points at the wanted target is a
/// success; one that points elsewhere is logged and skipped without failing
/// the remaining specs. An actual creation failure aborts the rest.
pub fn create_links(links: &[ResolvedLink]) -> Result<(), InstallerError> {
    for entry in links {
        if is_symlink(&entry.link) {
            match fs::read_link(&entry.link) {
                Ok(prior) if prior == entry.target => {
                    debug!(link = %entry.link.display(), "package link already exists");
                }
                Ok(prior) => {
                    warn!(
                        link = %entry.link.display(),
                        prior_target = %prior.display(),
                        "link exists with a different target; leaving it alone"
                    );
                }
                Err(err) => {
                    warn!(
                        link = %entry.link.display(),
                        error = %err,
                        "link exists but its target is unreadable; leaving it alone"
                    );
                }
            }
            continue;
        }

        symlink(&entry.target, &entry.link).map_err(|source| {
            InstallerError::SymlinkCreateFailed {
                link: entry.link.clone(),
                source,
            }
        })?;
        debug!(
            link = %entry.link.display(),
            target = %entry.target.display(),
            "package linked"
        );
    }
    Ok(())
}

/// Removes the given links in order.
///
/// A link name that is not currently a symlink is logged and skipped
/// (idempotent removal); an actual removal failure aborts the rest.
pub fn delete_links(links: &[ResolvedLink]) -> Result<(), InstallerError> {
    for entry in links {
        if !is_symlink(&entry.link) {
            warn!(link = %entry.link.display(), "expected package link not found; ignoring");
            continue;
        }

        fs::remove_file(&entry.link).map_err(|source| InstallerError::SymlinkRemoveFailed {
            link: entry.link.clone(),
            source,
        })?;
        debug!(link = %entry.link.display(), "package link removed");
    }
    Ok(())
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_symlink())
        .unwrap_or(false)
}

fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_dir(target, link)
    }
}
