use std::path::{Path, PathBuf};

use stowpack_core::{InstallerError, PackageDescriptor, TypeRegistry};
use tracing::{debug, info, warn};

use crate::layout::{build_install_path, StorageLayout};
use crate::links::{create_links, delete_links, resolve_links, ResolvedLink};
use crate::manifest::{remove_manifest, write_manifest};
use crate::store::{deactivate_registration, upsert_registration, RecordStore};

/// Sentinel file whose presence marks a managed host the installer must
/// refuse to run on.
pub const DEFAULT_MANAGED_HOST_MARKER: &str = "/var/www/.managed_host";

#[derive(Debug, Clone)]
pub struct InstallerOptions {
    pub managed_host_marker: PathBuf,
}

impl Default for InstallerOptions {
    fn default() -> Self {
        Self {
            managed_host_marker: PathBuf::from(DEFAULT_MANAGED_HOST_MARKER),
        }
    }
}

/// What one install/update placement actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub install_path: PathBuf,
    pub links: Vec<ResolvedLink>,
    pub registered: bool,
    pub manifest_path: Option<PathBuf>,
}

/// What one uninstall actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub install_path: PathBuf,
    pub unregistered: bool,
}

/// Placement plugin for a host package manager.
///
/// The host resolves, downloads, and extracts packages; this value is handed
/// one descriptor per install/update/uninstall event and owns the type
/// registry, the storage layout, and the registration store for the life of
/// the process. Entry points run to completion on one thread; the registry
/// is the only state that carries across events.
#[derive(Debug)]
pub struct PlatformInstaller<S> {
    layout: StorageLayout,
    types: TypeRegistry,
    store: S,
}

impl<S: RecordStore> PlatformInstaller<S> {
    pub fn new(layout: StorageLayout, store: S) -> Result<Self, InstallerError> {
        Self::with_options(layout, store, InstallerOptions::default())
    }

    /// Fails with `UnsupportedEnvironment` on a managed host and validates
    /// the installation tree before any event is accepted.
    pub fn with_options(
        layout: StorageLayout,
        store: S,
        options: InstallerOptions,
    ) -> Result<Self, InstallerError> {
        if options.managed_host_marker.exists() {
            return Err(InstallerError::UnsupportedEnvironment(
                options.managed_host_marker,
            ));
        }

        let types = TypeRegistry::with_defaults();
        layout.ensure_tree(&types)?;
        debug!(root = %layout.root().display(), "installation tree validated");

        Ok(Self {
            layout,
            types,
            store,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn supports(&self, package_type: &str) -> bool {
        self.types.supports(package_type)
    }

    /// Resolves the install path for a descriptor without creating it.
    pub fn install_path(
        &mut self,
        descriptor: &PackageDescriptor,
    ) -> Result<PathBuf, InstallerError> {
        let sub_path = self.validate(descriptor)?;
        build_install_path(
            &self.effective_layout(descriptor),
            &sub_path,
            descriptor.vendor(),
            descriptor.suffix(),
            false,
        )
    }

    pub fn is_installed(&mut self, descriptor: &PackageDescriptor) -> Result<bool, InstallerError> {
        Ok(self.install_path(descriptor)?.is_dir())
    }

    /// Install placement: resolve path, create the directory, publish
    /// links, upsert the registration, write the manifest.
    ///
    /// The host materializes package content into the returned path between
    /// directory creation and link publication. Registration and manifest
    /// failures are logged and never abort the transition.
    pub fn on_install(
        &mut self,
        descriptor: &PackageDescriptor,
    ) -> Result<InstallOutcome, InstallerError> {
        info!(
            package = descriptor.full_name(),
            version = descriptor.version(),
            "installing package"
        );

        let sub_path = self.validate(descriptor)?;
        let layout = self.effective_layout(descriptor);
        let install_path = build_install_path(
            &layout,
            &sub_path,
            descriptor.vendor(),
            descriptor.suffix(),
            true,
        )?;

        let links = resolve_links(&layout, &install_path, descriptor);
        create_links(&links)?;

        let registered = upsert_registration(&mut self.store, descriptor);

        let manifest_path = match write_manifest(&layout, &sub_path, descriptor) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "manifest write failed; continuing");
                None
            }
        };

        Ok(InstallOutcome {
            install_path,
            links,
            registered,
            manifest_path,
        })
    }

    /// Update placement: out with the old links, registration, and manifest,
    /// then install the target descriptor.
    pub fn on_update(
        &mut self,
        previous: &PackageDescriptor,
        target: &PackageDescriptor,
    ) -> Result<InstallOutcome, InstallerError> {
        info!(
            package = previous.full_name(),
            from = previous.version(),
            to = target.version(),
            "updating package"
        );

        let prev_sub_path = self.validate(previous)?;
        let prev_layout = self.effective_layout(previous);
        let prev_path = build_install_path(
            &prev_layout,
            &prev_sub_path,
            previous.vendor(),
            previous.suffix(),
            false,
        )?;

        delete_links(&resolve_links(&prev_layout, &prev_path, previous))?;
        deactivate_registration(&mut self.store, previous);
        if previous.sanitized_unique_name() != target.sanitized_unique_name() {
            remove_manifest(&prev_layout, &prev_sub_path, previous);
        }

        self.on_install(target)
    }

    /// Uninstall placement: remove links, soft-delete the registration,
    /// remove the manifest. The host removes the files afterwards.
    pub fn on_uninstall(
        &mut self,
        descriptor: &PackageDescriptor,
    ) -> Result<RemovalOutcome, InstallerError> {
        info!(
            package = descriptor.full_name(),
            version = descriptor.version(),
            "removing package"
        );

        let sub_path = self.validate(descriptor)?;
        let layout = self.effective_layout(descriptor);
        let install_path = build_install_path(
            &layout,
            &sub_path,
            descriptor.vendor(),
            descriptor.suffix(),
            false,
        )?;

        delete_links(&resolve_links(&layout, &install_path, descriptor))?;
        let unregistered = deactivate_registration(&mut self.store, descriptor);
        remove_manifest(&layout, &sub_path, descriptor);

        Ok(RemovalOutcome {
            install_path,
            unregistered,
        })
    }

    /// Registers any package-declared types, then resolves the storage
    /// subdirectory for the descriptor's own type.
    fn validate(&mut self, descriptor: &PackageDescriptor) -> Result<String, InstallerError> {
        for tag in self.types.register(&descriptor.config().supported_types) {
            debug!(%tag, "added supported package type");
        }

        match self.types.subpath(descriptor.package_type()) {
            Some(sub_path) => Ok(sub_path.to_string()),
            None => Err(InstallerError::UnsupportedPackageType(
                descriptor.package_type().to_string(),
            )),
        }
    }

    fn effective_layout(&self, descriptor: &PackageDescriptor) -> StorageLayout {
        match descriptor
            .config()
            .base_install_path
            .as_deref()
            .map(str::trim)
            .filter(|root| !root.is_empty())
        {
            Some(root) => self.layout.with_root(Path::new(root)),
            None => self.layout.clone(),
        }
    }
}
