//! Harness configuration
//!
//! Defaults, an optional TOML file and `GOLDENFMT_*` environment variables,
//! layered in that order. Command-line flags are applied on top by the binary.

pub mod policy;

pub use crate::policy::{ComparePolicy, ExpectedConvention};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_EXTENSION: &str = "kt";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("TOML support not enabled. Enable the 'toml-config' feature.")]
    TomlDisabled,
}

/// External formatter program, fed the source on stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl FormatterCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.program.is_empty()
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory the fixture paths are relative to
    pub fixture_root: PathBuf,

    /// Fixture file suffix, without the dot
    pub extension: String,

    /// File-name regex overriding the one derived from `extension`
    pub pattern: Option<String>,

    /// Descend into subdirectories of the fixture root
    pub recursive: bool,

    /// Where expected outputs live
    pub expected: ExpectedConvention,

    pub compare: ComparePolicy,

    /// Also check idempotence and determinism of the formatter
    pub strict: bool,

    /// Worker threads (None = one per logical CPU)
    pub jobs: Option<usize>,

    /// Per-case timeout in milliseconds
    pub timeout_ms: Option<u64>,

    pub formatter: FormatterCommand,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixture_root: PathBuf::from("testData/formatter"),
            extension: DEFAULT_EXTENSION.to_string(),
            pattern: None,
            recursive: true,
            expected: ExpectedConvention::default(),
            compare: ComparePolicy::default(),
            strict: false,
            jobs: None,
            timeout_ms: None,
            formatter: FormatterCommand::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().merge_with_env()
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml-config")]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Load configuration from TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn from_file(_path: &Path) -> Result<Self, ConfigError> {
        Err(ConfigError::TomlDisabled)
    }

    /// Merge with environment variables (env vars take precedence)
    pub fn merge_with_env(self) -> Self {
        self.merge_from(|key| std::env::var(key).ok())
    }

    /// Apply `GOLDENFMT_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored and the current setting is kept.
    pub fn merge_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("GOLDENFMT_FIXTURE_ROOT") {
            self.fixture_root = PathBuf::from(root);
        }

        if let Some(ext) = lookup("GOLDENFMT_EXTENSION") {
            self.extension = ext.trim_start_matches('.').to_string();
        }

        if let Some(pattern) = lookup("GOLDENFMT_PATTERN") {
            self.pattern = Some(pattern);
        }

        if let Some(val) = lookup("GOLDENFMT_RECURSIVE")
            && let Ok(recursive) = val.parse()
        {
            self.recursive = recursive;
        }

        if let Some(val) = lookup("GOLDENFMT_EXPECTED")
            && let Ok(expected) = val.parse()
        {
            self.expected = expected;
        }

        if let Some(val) = lookup("GOLDENFMT_COMPARE")
            && let Ok(compare) = val.parse()
        {
            self.compare = compare;
        }

        if let Some(val) = lookup("GOLDENFMT_STRICT")
            && let Ok(strict) = val.parse()
        {
            self.strict = strict;
        }

        if let Some(val) = lookup("GOLDENFMT_JOBS")
            && let Ok(jobs) = val.parse::<usize>()
        {
            self.jobs = (jobs > 0).then_some(jobs);
        }

        if let Some(val) = lookup("GOLDENFMT_TIMEOUT_MS")
            && let Ok(timeout) = val.parse::<u64>()
        {
            self.timeout_ms = (timeout > 0).then_some(timeout);
        }

        self
    }

    /// File-name regex used by fixture discovery.
    ///
    /// Without an explicit pattern this is `^([^.]+)\.<ext>$`: a stem without
    /// dots, so `Name.after.kt` style golden files are never picked up as inputs.
    pub fn inclusion_pattern(&self) -> String {
        match &self.pattern {
            Some(pattern) => pattern.clone(),
            None => default_pattern(&self.extension),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Resolve the fixture root against a base directory (usually the
    /// directory holding the registry manifest).
    pub fn resolve_root(&self, base: &Path) -> PathBuf {
        if self.fixture_root.is_absolute() {
            self.fixture_root.clone()
        } else {
            base.join(&self.fixture_root)
        }
    }
}

pub fn default_pattern(extension: &str) -> String {
    let mut escaped = String::with_capacity(extension.len());
    for ch in extension.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!(r"^([^.]+)\.{escaped}$")
}
