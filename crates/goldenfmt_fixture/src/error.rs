use std::error::Error;
use std::fmt::{self, Display};
use std::path::PathBuf;

use crate::path::{FixturePath, TestIdentifier};
use crate::registry::RegistryEntry;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("fixture root {} does not exist or is not a directory", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("invalid inclusion pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("failed to read directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse registry {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Registry entry whose identifier is not the one derived from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMismatch {
    pub entry: RegistryEntry,
    pub derived: TestIdentifier,
}

/// The registry and the fixture tree disagree.
///
/// Carries every offending path at once so a single run shows the full drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryDriftError {
    /// On disk, but no registry entry
    pub unregistered: Vec<FixturePath>,
    /// Registered, but no fixture on disk
    pub stale: Vec<RegistryEntry>,
    /// Registered more than once
    pub duplicated: Vec<FixturePath>,
    pub mismatched: Vec<IdentifierMismatch>,
}

impl InventoryDriftError {
    pub fn is_empty(&self) -> bool {
        self.unregistered.is_empty()
            && self.stale.is_empty()
            && self.duplicated.is_empty()
            && self.mismatched.is_empty()
    }

    pub fn offending_count(&self) -> usize {
        self.unregistered.len() + self.stale.len() + self.duplicated.len() + self.mismatched.len()
    }
}

impl Display for InventoryDriftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "test registry is out of date with the fixture tree ({} problem(s))",
            self.offending_count()
        )?;
        if !self.unregistered.is_empty() {
            write!(f, "\n  fixtures missing from the registry:")?;
            for path in &self.unregistered {
                write!(f, "\n    {path}")?;
            }
        }
        if !self.stale.is_empty() {
            write!(f, "\n  registry entries without a fixture on disk:")?;
            for entry in &self.stale {
                write!(f, "\n    {} ({})", entry.path, entry.id)?;
            }
        }
        if !self.duplicated.is_empty() {
            write!(f, "\n  fixtures registered more than once:")?;
            for path in &self.duplicated {
                write!(f, "\n    {path}")?;
            }
        }
        if !self.mismatched.is_empty() {
            write!(f, "\n  registry identifiers that do not match their fixture:")?;
            for mismatch in &self.mismatched {
                write!(
                    f,
                    "\n    {} is registered as {}, expected {}",
                    mismatch.entry.path, mismatch.entry.id, mismatch.derived
                )?;
            }
        }
        Ok(())
    }
}

impl Error for InventoryDriftError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub id: TestIdentifier,
    pub paths: Vec<FixturePath>,
}

/// Two or more distinct fixtures share one test identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCollisionError {
    pub collisions: Vec<Collision>,
}

impl Display for IdentifierCollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} test identifier(s) are shared by distinct fixtures",
            self.collisions.len()
        )?;
        for collision in &self.collisions {
            let paths = collision
                .paths
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "\n  {}: {paths}", collision.id)?;
        }
        Ok(())
    }
}

impl Error for IdentifierCollisionError {}

/// Suite-fatal inventory failure, raised before any case runs.
#[derive(Debug, thiserror::Error)]
pub enum ConsistencyError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Collision(#[from] IdentifierCollisionError),
    #[error(transparent)]
    Drift(#[from] InventoryDriftError),
}
