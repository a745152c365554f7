use std::fs;
use std::io;

use serde_json::{Map, Value};
use stowpack_core::{InstallerError, PackageDescriptor, TypeRegistry};
use tracing::{debug, warn};

use crate::layout::StorageLayout;

/// Writes the pretty-printed JSON manifest sidecar for a descriptor and
/// returns its path. The schema is `{name, version, type}` plus the
/// declared extra block, with the fixed keys taking precedence.
pub fn write_manifest(
    layout: &StorageLayout,
    sub_path: &str,
    descriptor: &PackageDescriptor,
) -> Result<std::path::PathBuf, InstallerError> {
    let path = layout.manifest_path(sub_path, &descriptor.sanitized_unique_name());

    let body = serde_json::to_vec_pretty(&manifest_payload(descriptor))
        .map_err(io::Error::from)
        .and_then(|mut body| {
            body.push(b'\n');
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, body)
        });

    match body {
        Ok(()) => {
            debug!(manifest = %path.display(), "package manifest written");
            Ok(path)
        }
        Err(source) => Err(InstallerError::ManifestWriteFailed { path, source }),
    }
}

/// Best-effort manifest removal; a missing file is success, a failed delete
/// is logged.
pub fn remove_manifest(layout: &StorageLayout, sub_path: &str, descriptor: &PackageDescriptor) {
    let path = layout.manifest_path(sub_path, &descriptor.sanitized_unique_name());
    match fs::remove_file(&path) {
        Ok(()) => debug!(manifest = %path.display(), "package manifest removed"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(manifest = %path.display(), error = %err, "failed to remove package manifest");
        }
    }
}

/// Reads back every manifest under the layout's type directories, skipping
/// unreadable entries with a warning. Inspection only.
pub fn read_manifests(layout: &StorageLayout, types: &TypeRegistry) -> Vec<Value> {
    let mut seen_dirs = Vec::new();
    let mut manifests = Vec::new();

    for (_, sub_path) in types.iter() {
        let dir = layout.manifest_dir(sub_path);
        if seen_dirs.contains(&dir) {
            continue;
        }
        seen_dirs.push(dir.clone());

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|err| err.to_string())
                .and_then(|raw| serde_json::from_str(&raw).map_err(|err| err.to_string()))
            {
                Ok(value) => manifests.push(value),
                Err(err) => {
                    warn!(manifest = %path.display(), error = %err, "skipping unreadable manifest");
                }
            }
        }
    }

    manifests
}

fn manifest_payload(descriptor: &PackageDescriptor) -> Value {
    let mut map = Map::new();
    map.insert(
        "name".to_string(),
        Value::String(descriptor.full_name().to_string()),
    );
    map.insert(
        "version".to_string(),
        Value::String(descriptor.version().to_string()),
    );
    map.insert(
        "type".to_string(),
        Value::String(descriptor.package_type().to_string()),
    );

    if let Value::Object(extra) = descriptor.extra() {
        for (key, value) in extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    Value::Object(map)
}
