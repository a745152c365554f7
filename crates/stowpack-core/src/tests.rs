use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde_json::json;

use crate::{InstallerError, LinkSpec, PackageDescriptor, TypeRegistry, APPLICATION, PLUGIN};

fn test_dir(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "stowpack-core-tests-{label}-{}-{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path
}

#[test]
fn parse_splits_vendor_and_suffix() {
    let descriptor =
        PackageDescriptor::parse("acme/widget", "application", "1.0.0", json!({}))
            .expect("must parse");
    assert_eq!(descriptor.full_name(), "acme/widget");
    assert_eq!(descriptor.vendor(), "acme");
    assert_eq!(descriptor.suffix(), "widget");
    assert_eq!(descriptor.package_type(), "application");
    assert_eq!(descriptor.version(), "1.0.0");
}

#[test]
fn parse_rejects_names_without_one_separator() {
    for raw in ["widget", "acme/", "/widget", "acme/widget/extra", ""] {
        let err = PackageDescriptor::parse(raw, "application", "1.0.0", json!({}))
            .expect_err("must reject");
        assert!(
            matches!(err, InstallerError::MalformedName(_)),
            "unexpected error for '{raw}': {err}"
        );
    }
}

#[test]
fn parse_defaults_type_to_application() {
    let descriptor =
        PackageDescriptor::parse("acme/widget", "", "1.0.0", json!({})).expect("must parse");
    assert_eq!(descriptor.package_type(), APPLICATION);
}

#[test]
fn config_type_overrides_host_type() {
    let extra = json!({ "config": { "type": "jetpack" } });
    let descriptor =
        PackageDescriptor::parse("acme/widget", "application", "1.0.0", extra).expect("must parse");
    assert_eq!(descriptor.package_type(), "jetpack");
}

#[test]
fn inline_config_is_used_without_filesystem_access() {
    let extra = json!({
        "config": {
            "links": [{ "target": "public", "link": "widget-ui" }],
            "base-install-path": "/srv/alt"
        }
    });
    let descriptor =
        PackageDescriptor::parse("acme/widget", "application", "1.0.0", extra).expect("must parse");
    assert_eq!(
        descriptor.links(),
        &[LinkSpec {
            target: Some("public".to_string()),
            link: Some("widget-ui".to_string()),
        }]
    );
    assert_eq!(
        descriptor.config().base_install_path.as_deref(),
        Some("/srv/alt")
    );
}

#[test]
fn config_file_values_override_extra_block() {
    let dir = test_dir("config-file");
    let config_path = dir.join("package.config.json");
    fs::write(
        &config_path,
        r#"{ "type": "library", "links": [{ "link": "from-file" }] }"#,
    )
    .expect("must write config file");

    let extra = json!({
        "type": "application",
        "config": config_path.to_string_lossy(),
    });
    let descriptor =
        PackageDescriptor::parse("acme/widget", "application", "1.0.0", extra).expect("must parse");
    assert_eq!(descriptor.package_type(), "library");
    assert_eq!(descriptor.links()[0].link.as_deref(), Some("from-file"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unreadable_config_file_is_rejected() {
    let extra = json!({ "config": "/nonexistent/stowpack/package.config.json" });
    let err = PackageDescriptor::parse("acme/widget", "application", "1.0.0", extra)
        .expect_err("must reject");
    assert!(matches!(err, InstallerError::InvalidConfigFile { .. }));
}

#[test]
fn non_map_config_file_is_rejected() {
    let dir = test_dir("bad-config");
    let config_path = dir.join("package.config.json");
    fs::write(&config_path, "[1, 2, 3]").expect("must write config file");

    let extra = json!({ "config": config_path.to_string_lossy() });
    let err = PackageDescriptor::parse("acme/widget", "application", "1.0.0", extra)
        .expect_err("must reject");
    match err {
        InstallerError::InvalidConfigFile { detail, .. } => {
            assert!(detail.contains("an array"), "unexpected detail: {detail}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn plugin_without_links_gets_default_link() {
    let descriptor =
        PackageDescriptor::parse("acme/widget", PLUGIN, "1.0.0", json!({})).expect("must parse");
    assert_eq!(
        descriptor.links(),
        &[LinkSpec {
            target: None,
            link: Some("widget".to_string()),
        }]
    );
}

#[test]
fn application_without_links_gets_none() {
    let descriptor =
        PackageDescriptor::parse("acme/widget", APPLICATION, "1.0.0", json!({}))
            .expect("must parse");
    assert!(descriptor.links().is_empty());
}

#[test]
fn sanitized_unique_name_replaces_unsafe_characters() {
    let descriptor =
        PackageDescriptor::parse("acme/widget", "application", "1.0.0 [beta]", json!({}))
            .expect("must parse");
    assert_eq!(descriptor.unique_name(), "acme/widget-1.0.0 [beta]");
    assert_eq!(
        descriptor.sanitized_unique_name(),
        "acme_widget-1.0.0__beta_"
    );
}

#[test]
fn registry_defaults_cover_builtin_types() {
    let registry = TypeRegistry::with_defaults();
    assert_eq!(registry.subpath("application"), Some("applications"));
    assert_eq!(registry.subpath("plugin"), Some("plugins"));
    assert_eq!(registry.subpath("library"), Some("plugins"));
    assert_eq!(registry.subpath("jetpack"), Some("plugins"));
    assert!(!registry.supports("theme"));
}

#[test]
fn registry_register_adds_absent_types_only() {
    let mut registry = TypeRegistry::with_defaults();

    let mut additions = BTreeMap::new();
    additions.insert("theme".to_string(), "themes".to_string());
    additions.insert("application".to_string(), "elsewhere".to_string());

    let added = registry.register(&additions);
    assert_eq!(added, vec!["theme"]);
    assert_eq!(registry.subpath("theme"), Some("themes"));
    // First writer wins; the builtin mapping is untouched.
    assert_eq!(registry.subpath("application"), Some("applications"));
}

#[test]
fn registry_registration_persists_across_events() {
    let mut registry = TypeRegistry::with_defaults();

    let mut first = BTreeMap::new();
    first.insert("theme".to_string(), "themes".to_string());
    registry.register(&first);

    let mut second = BTreeMap::new();
    second.insert("theme".to_string(), "other".to_string());
    let added = registry.register(&second);
    assert!(added.is_empty());
    assert_eq!(registry.subpath("theme"), Some("themes"));
}
