use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigSource, LinkSpec, PackageConfig};
use crate::error::InstallerError;
use crate::types::APPLICATION;

/// Characters replaced by `_` when a unique name becomes a file name.
const UNSAFE_NAME_CHARS: [char; 5] = [' ', '/', '\\', '[', ']'];

/// Metadata for one package instance handed over by the host tool.
///
/// Constructed fresh per host callback; parsing resolves the declared extra
/// block (including the optional inline-or-file `config` source) into a
/// [`PackageConfig`] exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    full_name: String,
    vendor: String,
    suffix: String,
    package_type: String,
    version: String,
    config: PackageConfig,
    extra: Value,
}

impl PackageDescriptor {
    /// Parses a raw host package into a descriptor.
    ///
    /// Fails with `MalformedName` unless `raw_name` splits into exactly two
    /// non-empty segments on `/`, and with `InvalidConfigFile` when the
    /// extra block or its config source cannot be understood. The only
    /// filesystem access is the optional config-file read.
    pub fn parse(
        raw_name: &str,
        raw_type: &str,
        version: &str,
        raw_extra: Value,
    ) -> Result<Self, InstallerError> {
        let (vendor, suffix) = split_full_name(raw_name)?;

        let base = match &raw_extra {
            Value::Null => PackageConfig::default(),
            Value::Object(_) => {
                serde_json::from_value(raw_extra.clone()).map_err(|err| {
                    InstallerError::InvalidConfigFile {
                        source_label: "extra block".to_string(),
                        detail: err.to_string(),
                    }
                })?
            }
            other => {
                return Err(InstallerError::InvalidConfigFile {
                    source_label: "extra block".to_string(),
                    detail: format!("expected a key-value map, got {}", json_kind(other)),
                });
            }
        };

        let overlay = match raw_extra.get("config") {
            None | Some(Value::Null) => PackageConfig::default(),
            Some(value) => resolve_config_source(value)?,
        };

        let mut config = base.merged(overlay);

        let package_type = config
            .package_type
            .clone()
            .filter(|tag| !tag.trim().is_empty())
            .or_else(|| {
                let trimmed = raw_type.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| APPLICATION.to_string());

        // A plugin with no declared links gets the default web link for its
        // suffix.
        if package_type == crate::types::PLUGIN
            && config.links.as_ref().map_or(true, Vec::is_empty)
        {
            config.links = Some(vec![LinkSpec {
                target: None,
                link: Some(suffix.to_string()),
            }]);
        }

        Ok(Self {
            full_name: raw_name.to_string(),
            vendor: vendor.to_string(),
            suffix: suffix.to_string(),
            package_type,
            version: version.to_string(),
            config,
            extra: raw_extra,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn package_type(&self) -> &str {
        &self.package_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// The raw extra block as declared, for manifest dumps.
    pub fn extra(&self) -> &Value {
        &self.extra
    }

    pub fn links(&self) -> &[LinkSpec] {
        self.config.links.as_deref().unwrap_or_default()
    }

    pub fn unique_name(&self) -> String {
        format!("{}-{}", self.full_name, self.version)
    }

    /// Unique name with filesystem-unsafe characters replaced by `_`.
    pub fn sanitized_unique_name(&self) -> String {
        self.unique_name()
            .chars()
            .map(|ch| {
                if UNSAFE_NAME_CHARS.contains(&ch) {
                    '_'
                } else {
                    ch
                }
            })
            .collect()
    }
}

fn split_full_name(raw_name: &str) -> Result<(&str, &str), InstallerError> {
    let Some((vendor, suffix)) = raw_name.split_once('/') else {
        return Err(InstallerError::MalformedName(raw_name.to_string()));
    };
    if vendor.is_empty() || suffix.is_empty() || suffix.contains('/') {
        return Err(InstallerError::MalformedName(raw_name.to_string()));
    }
    Ok((vendor, suffix))
}

fn resolve_config_source(value: &Value) -> Result<PackageConfig, InstallerError> {
    let source: ConfigSource =
        serde_json::from_value(value.clone()).map_err(|err| InstallerError::InvalidConfigFile {
            source_label: "inline config".to_string(),
            detail: err.to_string(),
        })?;

    match source {
        ConfigSource::Inline(config) => Ok(config),
        ConfigSource::File(path) => read_config_file(&path),
    }
}

fn read_config_file(path: &Path) -> Result<PackageConfig, InstallerError> {
    let source_label = path.display().to_string();

    let raw = fs::read_to_string(path).map_err(|err| InstallerError::InvalidConfigFile {
        source_label: source_label.clone(),
        detail: err.to_string(),
    })?;

    let value: Value =
        serde_json::from_str(&raw).map_err(|err| InstallerError::InvalidConfigFile {
            source_label: source_label.clone(),
            detail: err.to_string(),
        })?;
    if !value.is_object() {
        return Err(InstallerError::InvalidConfigFile {
            source_label,
            detail: format!("expected a key-value map, got {}", json_kind(&value)),
        });
    }

    debug!(config_file = %path.display(), "merged package config file");
    serde_json::from_value(value).map_err(|err| InstallerError::InvalidConfigFile {
        source_label,
        detail: err.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
