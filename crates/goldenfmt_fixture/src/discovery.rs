use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace};

use crate::error::DiscoveryError;
use crate::path::FixturePath;
use goldenfmt_config::HarnessConfig;

/// Walks a fixture root and collects the files whose name matches the
/// inclusion pattern.
#[derive(Debug, Clone)]
pub struct FixtureDiscoverer {
    root: PathBuf,
    pattern: Regex,
    recursive: bool,
}

impl FixtureDiscoverer {
    pub fn new(
        root: impl Into<PathBuf>,
        pattern: &str,
        recursive: bool,
    ) -> Result<Self, DiscoveryError> {
        let pattern = Regex::new(pattern).map_err(|source| DiscoveryError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            root: root.into(),
            pattern,
            recursive,
        })
    }

    /// Discoverer for `root` using the pattern and recursion setting of `config`.
    pub fn from_config(config: &HarnessConfig, root: &Path) -> Result<Self, DiscoveryError> {
        Self::new(root, &config.inclusion_pattern(), config.recursive)
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    /// Relative paths of all matching fixtures, in lexicographic order.
    pub fn discover(&self) -> Result<BTreeSet<FixturePath>, DiscoveryError> {
        if !self.root.is_dir() {
            return Err(DiscoveryError::DirectoryNotFound(self.root.clone()));
        }

        let mut found = BTreeSet::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| DiscoveryError::Io {
                path: dir.clone(),
                source,
            })?;

            for entry in entries {
                let entry = entry.map_err(|source| DiscoveryError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|source| DiscoveryError::Io {
                    path: path.clone(),
                    source,
                })?;

                if file_type.is_dir() {
                    if self.recursive {
                        pending.push(path);
                    }
                    continue;
                }

                if !path.is_file() {
                    continue;
                }

                let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                    trace!(path = %path.display(), "skipping non UTF-8 file name");
                    continue;
                };

                if !self.matches(name) {
                    continue;
                }

                if let Some(fixture) = FixturePath::from_relative(&self.root, &path) {
                    found.insert(fixture);
                }
            }
        }

        debug!(
            root = %self.root.display(),
            fixtures = found.len(),
            "discovered fixtures"
        );
        Ok(found)
    }
}
