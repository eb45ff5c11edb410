//! Package manifest model - the project manifest and per-package package.json

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Project-level manifest file read by the CLI
pub const PROJECT_MANIFEST: &str = "spm-package.json";

/// Manifest file shipped inside every package archive
pub const PACKAGE_MANIFEST: &str = "package.json";

/// A single dependency request: a package name plus a reference string.
///
/// The reference is an exact version, a version range, a URL, or a local
/// filesystem path. It stays untouched until the pinner replaces ranges
/// with concrete versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub reference: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }
}

/// Parsed package manifest, limited to the fields the pipeline consumes.
///
/// Every field is optional in the source JSON; unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub bin: BTreeMap<String, String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse manifest bytes, e.g. pulled out of a package archive
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read and parse a manifest file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        Self::from_slice(&contents)
    }

    /// Flatten the dependencies map into dependency requests
    pub fn dependency_list(&self) -> Vec<Dependency> {
        self.dependencies
            .iter()
            .map(|(name, reference)| Dependency::new(name, reference))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let json = br#"{
            "name": "demo",
            "version": "1.0.0",
            "dependencies": { "left-pad": "^1.3.0" },
            "bin": { "demo": "./bin/demo.js" },
            "scripts": { "postinstall": "node setup.js" }
        }"#;

        let manifest = Manifest::from_slice(json).unwrap();
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.dependencies.get("left-pad").unwrap(), "^1.3.0");
        assert_eq!(manifest.bin.get("demo").unwrap(), "./bin/demo.js");
        assert_eq!(manifest.scripts.get("postinstall").unwrap(), "node setup.js");
    }

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::from_slice(b"{}").unwrap();
        assert!(manifest.name.is_empty());
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.bin.is_empty());
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn test_dependency_list() {
        let json = br#"{"dependencies": {"a": "1.0.0", "b": "^2.0.0"}}"#;
        let manifest = Manifest::from_slice(json).unwrap();

        let deps = manifest.dependency_list();
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&Dependency::new("a", "1.0.0")));
        assert!(deps.contains(&Dependency::new("b", "^2.0.0")));
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        assert!(Manifest::from_slice(b"not json").is_err());
    }
}
