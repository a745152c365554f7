use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use stowpack_core::PackageDescriptor;

/// On-disk shape of a package descriptor file: the handful of fields the
/// host package manager would normally hand over in memory.
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    name: String,
    version: String,
    #[serde(rename = "type", default)]
    package_type: String,
    #[serde(default)]
    extra: Value,
}

pub fn load_descriptor(path: &Path) -> Result<PackageDescriptor> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read descriptor file {}", path.display()))?;
    let file: DescriptorFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse descriptor file {}", path.display()))?;

    PackageDescriptor::parse(&file.name, &file.package_type, &file.version, file.extra)
        .with_context(|| format!("invalid descriptor in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_dir(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        path.push(format!(
            "stowpack-cli-tests-{label}-{}-{}",
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&path).expect("must create test dir");
        path
    }

    #[test]
    fn load_descriptor_round_trip() {
        let dir = test_dir("load");
        let path = dir.join("widget.json");
        fs::write(
            &path,
            r#"{
                "name": "acme/widget",
                "version": "1.2.0",
                "type": "plugin",
                "extra": { "config": { "links": [{ "link": "widget-ui" }] } }
            }"#,
        )
        .expect("must write descriptor");

        let descriptor = load_descriptor(&path).expect("must load descriptor");
        assert_eq!(descriptor.full_name(), "acme/widget");
        assert_eq!(descriptor.version(), "1.2.0");
        assert_eq!(descriptor.package_type(), "plugin");
        assert_eq!(descriptor.links()[0].link.as_deref(), Some("widget-ui"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn load_descriptor_reports_missing_file() {
        let err = load_descriptor(Path::new("/nonexistent/stowpack/widget.json"))
            .expect_err("missing file must fail");
        assert!(
            format!("{err:#}").contains("failed to read descriptor file"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn load_descriptor_rejects_malformed_name() {
        let dir = test_dir("bad-name");
        let path = dir.join("widget.json");
        fs::write(&path, r#"{ "name": "widget", "version": "1.0.0" }"#)
            .expect("must write descriptor");

        let err = load_descriptor(&path).expect_err("malformed name must fail");
        assert!(
            format!("{err:#}").contains("invalid descriptor"),
            "unexpected error: {err:#}"
        );

        let _ = fs::remove_dir_all(dir);
    }
}
