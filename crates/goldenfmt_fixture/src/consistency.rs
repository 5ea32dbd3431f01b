use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::discovery::FixtureDiscoverer;
use crate::error::{
    Collision, ConsistencyError, IdentifierCollisionError, IdentifierMismatch, InventoryDriftError,
};
use crate::ident::derive_identifier;
use crate::path::{FixturePath, TestIdentifier};
use crate::registry::Registry;

/// Identifiers shared by distinct fixtures, either in the registry itself or
/// among the derived identifiers of the discovered fixtures.
pub fn find_collisions(
    registry: &Registry,
    discovered: &BTreeSet<FixturePath>,
) -> Result<(), IdentifierCollisionError> {
    let mut owners: BTreeMap<&TestIdentifier, BTreeSet<FixturePath>> = BTreeMap::new();
    for entry in registry {
        owners.entry(&entry.id).or_default().insert(entry.path.clone());
    }

    let derived: Vec<(TestIdentifier, &FixturePath)> = discovered
        .iter()
        .map(|path| (derive_identifier(path), path))
        .collect();
    let mut derived_owners: BTreeMap<&TestIdentifier, BTreeSet<FixturePath>> = BTreeMap::new();
    for (id, path) in &derived {
        derived_owners.entry(id).or_default().insert((*path).clone());
    }

    let mut shared: BTreeMap<TestIdentifier, BTreeSet<FixturePath>> = BTreeMap::new();
    for (id, paths) in owners.into_iter().chain(derived_owners) {
        if paths.len() > 1 {
            shared.entry(id.clone()).or_default().extend(paths);
        }
    }

    if shared.is_empty() {
        return Ok(());
    }

    Err(IdentifierCollisionError {
        collisions: shared
            .into_iter()
            .map(|(id, paths)| Collision {
                id,
                paths: paths.into_iter().collect(),
            })
            .collect(),
    })
}

/// Symmetric difference between the registry and the fixtures on disk, plus
/// duplicate registrations and identifiers that no longer match their path.
pub fn find_drift(registry: &Registry, discovered: &BTreeSet<FixturePath>) -> InventoryDriftError {
    let registered = registry.paths();

    let unregistered = discovered.difference(&registered).cloned().collect();

    let mut stale: Vec<_> = registry
        .iter()
        .filter(|entry| !discovered.contains(&entry.path))
        .cloned()
        .collect();
    stale.sort_by(|a, b| a.path.cmp(&b.path));
    stale.dedup();

    let mut seen = BTreeSet::new();
    let mut duplicated = BTreeSet::new();
    for entry in registry {
        if !seen.insert(&entry.path) {
            duplicated.insert(entry.path.clone());
        }
    }

    let mut mismatched: Vec<_> = registry
        .iter()
        .filter_map(|entry| {
            let derived = derive_identifier(&entry.path);
            (derived != entry.id).then(|| IdentifierMismatch {
                entry: entry.clone(),
                derived,
            })
        })
        .collect();
    mismatched.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));

    InventoryDriftError {
        unregistered,
        stale,
        duplicated: duplicated.into_iter().collect(),
        mismatched,
    }
}

/// Check an already discovered fixture set against the registry.
///
/// Collisions are reported ahead of drift; either one is fatal for the suite.
pub fn check_consistency(
    registry: &Registry,
    discovered: &BTreeSet<FixturePath>,
) -> Result<(), ConsistencyError> {
    find_collisions(registry, discovered)?;

    let drift = find_drift(registry, discovered);
    if !drift.is_empty() {
        return Err(drift.into());
    }

    debug!(
        fixtures = discovered.len(),
        cases = registry.len(),
        "test registry matches fixture tree"
    );
    Ok(())
}

/// Discover fixtures and check them against the registry in one step.
pub fn check_inventory(
    registry: &Registry,
    discoverer: &FixtureDiscoverer,
) -> Result<BTreeSet<FixturePath>, ConsistencyError> {
    let discovered = discoverer.discover()?;
    check_consistency(registry, &discovered)?;
    Ok(discovered)
}
