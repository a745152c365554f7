use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stowpack_core::{InstallerError, PackageDescriptor};
use tracing::{debug, warn};

/// One registered application row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppRecord {
    pub api_name: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub url: Option<String>,
    pub is_url_external: bool,
    pub import_url: Option<String>,
    pub requires_fullscreen: bool,
    pub allow_fullscreen_toggle: bool,
    pub toggle_location: Option<String>,
    pub requires_plugin: i64,
}

/// Storage-agnostic registration store keyed by `api_name`.
///
/// Implementations receive typed records; no query text is ever assembled
/// from package-supplied strings.
pub trait RecordStore {
    fn find_by_api_name(&self, api_name: &str) -> Result<Option<AppRecord>, InstallerError>;
    fn upsert(&mut self, record: AppRecord) -> Result<(), InstallerError>;
    /// Soft delete: clears `is_active` on the matching row. Returns whether
    /// a row matched.
    fn deactivate(&mut self, api_name: &str) -> Result<bool, InstallerError>;
}

/// Builds the registration payload for a descriptor, or `None` when the
/// package declares no `application` block.
pub fn registration_payload(descriptor: &PackageDescriptor) -> Option<AppRecord> {
    let app = descriptor.config().application.as_ref()?;
    let api_name = app
        .api_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| descriptor.suffix().to_string());

    Some(AppRecord {
        name: app.name.clone().unwrap_or_else(|| api_name.clone()),
        api_name,
        description: app.description.clone(),
        is_active: app.is_active,
        url: app.url.clone(),
        is_url_external: app.is_url_external,
        import_url: app.import_url.clone(),
        requires_fullscreen: app.requires_fullscreen,
        allow_fullscreen_toggle: app.allow_fullscreen_toggle,
        toggle_location: app.toggle_location.clone(),
        requires_plugin: 1,
    })
}

/// Inserts or updates the descriptor's registration row.
///
/// Store failures are logged and reported as `false`; they never abort the
/// filesystem steps that preceded them. A package without an `application`
/// block is a successful no-op.
pub fn upsert_registration<S: RecordStore>(store: &mut S, descriptor: &PackageDescriptor) -> bool {
    let Some(payload) = registration_payload(descriptor) else {
        debug!(package = descriptor.full_name(), "no registration requested");
        return true;
    };

    let api_name = payload.api_name.clone();
    let result = store.find_by_api_name(&api_name).and_then(|existing| {
        let record = match existing {
            Some(current) => merge_into(current, payload),
            None => payload,
        };
        store.upsert(record)
    });

    match result {
        Ok(()) => {
            debug!(%api_name, "package registered");
            true
        }
        Err(err) => {
            warn!(%api_name, error = %err, "package registration failed");
            false
        }
    }
}

/// Soft-deletes the descriptor's registration row, with the same
/// non-propagating failure policy as [`upsert_registration`].
pub fn deactivate_registration<S: RecordStore>(
    store: &mut S,
    descriptor: &PackageDescriptor,
) -> bool {
    let Some(payload) = registration_payload(descriptor) else {
        debug!(package = descriptor.full_name(), "no registration requested");
        return true;
    };

    match store.deactivate(&payload.api_name) {
        Ok(found) => {
            debug!(api_name = %payload.api_name, found, "package unregistered");
            true
        }
        Err(err) => {
            warn!(api_name = %payload.api_name, error = %err, "package unregistration failed");
            false
        }
    }
}

// Key and display name survive an update; everything else follows the
// incoming payload.
fn merge_into(current: AppRecord, incoming: AppRecord) -> AppRecord {
    AppRecord {
        api_name: current.api_name,
        name: current.name,
        ..incoming
    }
}

/// Registration store backed by a single JSON file of records.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<AppRecord>, InstallerError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(InstallerError::RegistrationFailed {
                    detail: format!("failed to read {}: {err}", self.path.display()),
                });
            }
        };

        serde_json::from_str(&raw).map_err(|err| InstallerError::RegistrationFailed {
            detail: format!("failed to parse {}: {err}", self.path.display()),
        })
    }

    fn save(&self, records: &[AppRecord]) -> Result<(), InstallerError> {
        let body =
            serde_json::to_vec_pretty(records).map_err(|err| InstallerError::RegistrationFailed {
                detail: format!("failed to serialize records: {err}"),
            })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| InstallerError::RegistrationFailed {
                detail: format!("failed to create {}: {err}", parent.display()),
            })?;
        }
        fs::write(&self.path, body).map_err(|err| InstallerError::RegistrationFailed {
            detail: format!("failed to write {}: {err}", self.path.display()),
        })
    }
}

impl RecordStore for JsonRecordStore {
    fn find_by_api_name(&self, api_name: &str) -> Result<Option<AppRecord>, InstallerError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|record| record.api_name == api_name))
    }

    fn upsert(&mut self, record: AppRecord) -> Result<(), InstallerError> {
        let mut records = self.load()?;
        match records
            .iter_mut()
            .find(|existing| existing.api_name == record.api_name)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    fn deactivate(&mut self, api_name: &str) -> Result<bool, InstallerError> {
        let mut records = self.load()?;
        let Some(record) = records
            .iter_mut()
            .find(|record| record.api_name == api_name)
        else {
            return Ok(false);
        };

        record.is_active = false;
        self.save(&records)?;
        Ok(true)
    }
}

/// In-memory registration store, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<AppRecord>,
    failing: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, for exercising the non-fatal
    /// registration policy.
    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            failing: true,
        }
    }

    pub fn records(&self) -> &[AppRecord] {
        &self.records
    }

    fn check(&self) -> Result<(), InstallerError> {
        if self.failing {
            return Err(InstallerError::RegistrationFailed {
                detail: "record store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl RecordStore for MemoryRecordStore {
    fn find_by_api_name(&self, api_name: &str) -> Result<Option<AppRecord>, InstallerError> {
        self.check()?;
        Ok(self
            .records
            .iter()
            .find(|record| record.api_name == api_name)
            .cloned())
    }

    fn upsert(&mut self, record: AppRecord) -> Result<(), InstallerError> {
        self.check()?;
        match self
            .records
            .iter_mut()
            .find(|existing| existing.api_name == record.api_name)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    fn deactivate(&mut self, api_name: &str) -> Result<bool, InstallerError> {
        self.check()?;
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.api_name == api_name)
        else {
            return Ok(false);
        };

        record.is_active = false;
        Ok(true)
    }
}
