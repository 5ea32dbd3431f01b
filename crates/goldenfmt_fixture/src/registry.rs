use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;
use crate::ident::derive_identifier;
use crate::path::{FixturePath, TestIdentifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: TestIdentifier,
    pub path: FixturePath,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>, path: impl Into<FixturePath>) -> Self {
        Self {
            id: TestIdentifier::new(id),
            path: path.into(),
        }
    }

    /// Entry whose identifier is derived from the path.
    pub fn derived(path: impl Into<FixturePath>) -> Self {
        let path = path.into();
        Self {
            id: derive_identifier(&path),
            path,
        }
    }
}

/// Where the registry was generated from, as recorded by the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

/// On-disk JSON form of the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(flatten)]
    pub metadata: RegistryMetadata,
    pub cases: Vec<RegistryEntry>,
}

/// Static table of test cases, loaded once per run and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    by_id: AHashMap<TestIdentifier, usize>,
    metadata: RegistryMetadata,
}

impl Registry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self::with_metadata(entries, RegistryMetadata::default())
    }

    pub fn with_metadata(entries: Vec<RegistryEntry>, metadata: RegistryMetadata) -> Self {
        let mut by_id = AHashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            // first entry wins; duplicates surface through the consistency checker
            by_id.entry(entry.id.clone()).or_insert(idx);
        }
        Self {
            entries,
            by_id,
            metadata,
        }
    }

    pub fn from_pairs<I, S, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<FixturePath>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(id, path)| RegistryEntry::new(id, path))
                .collect(),
        )
    }

    pub fn from_manifest(manifest: RegistryManifest) -> Self {
        Self::with_metadata(manifest.cases, manifest.metadata)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let manifest: RegistryManifest = serde_json::from_str(text)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Load a JSON manifest. A relative `root` in the manifest is resolved
    /// against the manifest's directory.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: RegistryManifest =
            serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(root) = manifest.metadata.root.take() {
            let base = path.parent().unwrap_or(Path::new("."));
            manifest.metadata.root = Some(if root.is_absolute() {
                root
            } else {
                base.join(root)
            });
        }

        debug!(
            registry = %path.display(),
            cases = manifest.cases.len(),
            "loaded test registry"
        );
        Ok(Self::from_manifest(manifest))
    }

    pub fn to_manifest(&self) -> RegistryManifest {
        RegistryManifest {
            metadata: self.metadata.clone(),
            cases: self.entries.clone(),
        }
    }

    pub fn metadata(&self) -> &RegistryMetadata {
        &self.metadata
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.by_id
            .get(&TestIdentifier::new(id))
            .map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn paths(&self) -> BTreeSet<FixturePath> {
        self.entries.iter().map(|entry| entry.path.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a RegistryEntry;
    type IntoIter = std::slice::Iter<'a, RegistryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_by_identifier() {
        let registry = Registry::from_pairs([("testAlpha", "Alpha.src"), ("testBeta", "Beta.src")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("testBeta").unwrap().path.as_str(), "Beta.src");
        assert!(!registry.contains("testGamma"));
    }

    #[test]
    fn test_duplicate_identifier_keeps_first() {
        let registry = Registry::from_pairs([("testIf", "If.kt"), ("testIf", "if.kt")]);
        assert_eq!(registry.get("testIf").unwrap().path.as_str(), "If.kt");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_parse_manifest() {
        let registry = Registry::from_json(
            r#"{
                "root": "testData/formatter",
                "pattern": "^([^.]+)\\.kt$",
                "recursive": true,
                "cases": [
                    { "id": "testBlockFor", "path": "BlockFor.kt" },
                    { "id": "testClass", "path": "Class.kt" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.metadata().pattern.as_deref(), Some(r"^([^.]+)\.kt$"));
        assert_eq!(registry.metadata().recursive, Some(true));
    }

    #[test]
    fn test_metadata_is_optional() {
        let registry = Registry::from_json(r#"{ "cases": [] }"#).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.metadata(), &RegistryMetadata::default());
    }

    #[test]
    fn test_load_resolves_root_against_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("registry.json");
        fs::write(
            &manifest,
            r#"{ "root": "fixtures", "cases": [{ "id": "testA", "path": "A.kt" }] }"#,
        )
        .unwrap();

        let registry = Registry::load(&manifest).unwrap();
        assert_eq!(registry.metadata().root, Some(dir.path().join("fixtures")));
    }

    #[test]
    fn test_load_reports_malformed_json() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("registry.json");
        fs::write(&manifest, "{ cases: ").unwrap();
        assert!(matches!(
            Registry::load(&manifest),
            Err(RegistryError::Parse { .. })
        ));
        assert!(matches!(
            Registry::load(&dir.path().join("missing.json")),
            Err(RegistryError::Read { .. })
        ));
    }

    #[test]
    fn test_manifest_round_trips_through_json() {
        let registry = Registry::new(vec![RegistryEntry::derived("idioms/If.kt")]);
        let json = serde_json::to_string(&registry.to_manifest()).unwrap();
        let reloaded = Registry::from_json(&json).unwrap();
        assert_eq!(reloaded.entries(), registry.entries());
        assert_eq!(reloaded.entries()[0].id.as_str(), "testIdiomsIf");
    }
}
