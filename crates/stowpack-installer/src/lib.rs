mod layout;
mod links;
mod manifest;
mod plugin;
mod store;

pub use layout::{build_install_path, StorageLayout};
pub use links::{create_links, delete_links, resolve_links, ResolvedLink};
pub use manifest::{read_manifests, remove_manifest, write_manifest};
pub use plugin::{
    InstallOutcome, InstallerOptions, PlatformInstaller, RemovalOutcome,
    DEFAULT_MANAGED_HOST_MARKER,
};
pub use store::{
    deactivate_registration, registration_payload, upsert_registration, AppRecord,
    JsonRecordStore, MemoryRecordStore, RecordStore,
};
