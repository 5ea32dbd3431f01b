use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Fixture location relative to the fixture root, always `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FixturePath(String);

impl FixturePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./").trim_start_matches('/');
        Self(trimmed.to_string())
    }

    /// Build from a filesystem path below `root`. Returns `None` when `path`
    /// is not under `root` or is not valid UTF-8.
    pub fn from_relative(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Directory part, empty for fixtures directly under the root.
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Same directory, different file name.
    pub fn with_file_name(&self, name: &str) -> Self {
        match self.parent() {
            "" => Self(name.to_string()),
            parent => Self(format!("{parent}/{name}")),
        }
    }

    pub fn to_path(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl From<String> for FixturePath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for FixturePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<FixturePath> for String {
    fn from(value: FixturePath) -> Self {
        value.0
    }
}

impl fmt::Display for FixturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a single test case, e.g. `testBlockFor`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestIdentifier(String);

impl TestIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_separators() {
        let path = FixturePath::new(r".\idioms\BlockFor.kt");
        assert_eq!(path.as_str(), "idioms/BlockFor.kt");
        assert_eq!(path.parent(), "idioms");
        assert_eq!(path.file_name(), "BlockFor.kt");
        assert_eq!(path.stem(), "BlockFor");
        assert_eq!(path.extension(), Some("kt"));
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let path = FixturePath::new(".hidden");
        assert_eq!(path.stem(), ".hidden");
        assert_eq!(path.extension(), None);
    }

    #[test]
    fn test_with_file_name() {
        let path = FixturePath::new("a/b/If.kt");
        assert_eq!(path.with_file_name("If.after.kt").as_str(), "a/b/If.after.kt");
        assert_eq!(
            FixturePath::new("If.kt").with_file_name("If.after.kt").as_str(),
            "If.after.kt"
        );
    }

    #[test]
    fn test_from_relative() {
        let root = Path::new("/data/formatter");
        let file = root.join("idioms").join("Class.kt");
        assert_eq!(
            FixturePath::from_relative(root, &file),
            Some(FixturePath::new("idioms/Class.kt"))
        );
        assert_eq!(FixturePath::from_relative(root, Path::new("/etc/x.kt")), None);
    }
}
