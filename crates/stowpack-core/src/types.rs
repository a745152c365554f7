use std::collections::BTreeMap;

/// The package is a web application (HTML5/javascript).
pub const APPLICATION: &str = "application";
/// The package is a code/app hybrid.
pub const PLUGIN: &str = "plugin";
/// The package is a code library.
pub const LIBRARY: &str = "library";
/// The package is a self-contained bundle.
pub const JETPACK: &str = "jetpack";

/// Runtime-extensible mapping of package type tags to storage
/// subdirectories.
///
/// Packages may add mappings through `extra.supported-types`; the first
/// writer wins and mappings persist for the lifetime of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeRegistry {
    pub fn with_defaults() -> Self {
        let mut types = BTreeMap::new();
        types.insert(APPLICATION.to_string(), "applications".to_string());
        types.insert(PLUGIN.to_string(), "plugins".to_string());
        types.insert(LIBRARY.to_string(), "plugins".to_string());
        types.insert(JETPACK.to_string(), "plugins".to_string());
        Self { types }
    }

    pub fn supports(&self, package_type: &str) -> bool {
        self.types.contains_key(package_type)
    }

    pub fn subpath(&self, package_type: &str) -> Option<&str> {
        self.types.get(package_type).map(String::as_str)
    }

    /// Adds mappings that are not already present; an existing mapping is
    /// never overwritten by a later package. Returns the tags actually
    /// added.
    pub fn register(&mut self, additions: &BTreeMap<String, String>) -> Vec<String> {
        let mut added = Vec::new();
        for (tag, sub_path) in additions {
            if self.types.contains_key(tag) {
                continue;
            }
            self.types.insert(tag.clone(), sub_path.clone());
            added.push(tag.clone());
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types
            .iter()
            .map(|(tag, sub_path)| (tag.as_str(), sub_path.as_str()))
    }
}
