use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One symlink published from the web root into the install tree.
///
/// `target` is relative to the package install path; an absent target links
/// the install path itself. `link` is relative to the web root and defaults
/// to the package suffix.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinkSpec {
    pub target: Option<String>,
    pub link: Option<String>,
}

/// The `extra.config` block: either declared inline or the path of a JSON
/// file to read at parse time. Config files are declarative data only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigSource {
    Inline(PackageConfig),
    File(PathBuf),
}

/// Installer-relevant configuration a package declares through its extra
/// block and optional config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageConfig {
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub links: Option<Vec<LinkSpec>>,
    pub supported_types: BTreeMap<String, String>,
    pub application: Option<AppRegistration>,
    pub base_install_path: Option<String>,
}

impl PackageConfig {
    /// Field-wise merge where `overlay` values win when declared.
    pub fn merged(self, overlay: PackageConfig) -> PackageConfig {
        PackageConfig {
            package_type: overlay.package_type.or(self.package_type),
            links: overlay.links.or(self.links),
            supported_types: if overlay.supported_types.is_empty() {
                self.supported_types
            } else {
                overlay.supported_types
            },
            application: overlay.application.or(self.application),
            base_install_path: overlay.base_install_path.or(self.base_install_path),
        }
    }
}

/// Fields of the `extra.application` registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppRegistration {
    pub api_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub url: Option<String>,
    pub is_url_external: bool,
    pub import_url: Option<String>,
    pub requires_fullscreen: bool,
    pub allow_fullscreen_toggle: bool,
    pub toggle_location: Option<String>,
}
