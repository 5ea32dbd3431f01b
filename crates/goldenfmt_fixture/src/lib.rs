//! Fixture inventory: discovery on disk, identifier derivation, the static
//! test registry and the check that keeps the two in sync.

pub mod consistency;
pub mod discovery;
pub mod error;
pub mod ident;
pub mod path;
pub mod registry;

pub use consistency::{check_consistency, check_inventory, find_collisions, find_drift};
pub use discovery::FixtureDiscoverer;
pub use error::{
    Collision, ConsistencyError, DiscoveryError, IdentifierCollisionError, IdentifierMismatch,
    InventoryDriftError, RegistryError,
};
pub use ident::derive_identifier;
pub use path::{FixturePath, TestIdentifier};
pub use registry::{Registry, RegistryEntry, RegistryManifest, RegistryMetadata};
