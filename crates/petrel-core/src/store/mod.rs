//! Object store abstraction.
//!
//! Persistence of federated objects is an external collaborator; this
//! module defines the trait the pipeline consumes and the record it
//! exchanges. The trait is synchronous (no async) to keep the core
//! sans-IO.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;
use petrel_proto::{Guid, Handle, ObjectKind};
use serde::{Deserialize, Serialize};

/// Reference to a relayable object's parent, carried on the record so
/// authorization never needs a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Guid of the parent object.
    pub guid: Guid,
    /// Origin handle of the parent's author: the delegated federation
    /// authority for the child.
    pub author: Handle,
}

/// A stored federated object, as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Kind of the object.
    pub kind: ObjectKind,
    /// Globally unique identifier.
    pub guid: Guid,
    /// Origin handle of the object's own author.
    pub author: Handle,
    /// Parent reference; present exactly when the object is relayable.
    pub parent: Option<ParentRef>,
}

impl ObjectRecord {
    /// Whether authority over this object is delegated to its parent's
    /// author.
    #[must_use]
    pub fn is_relayable(&self) -> bool {
        self.parent.is_some()
    }
}

/// Storage abstraction for federated objects.
///
/// This trait must be:
/// - `Clone`: can be handed to multiple pipeline instances
/// - `Send + Sync`: thread-safe for concurrent receives
/// - Synchronous: no async methods (sans-IO compliance)
///
/// # Clone semantics
///
/// Implementations typically share internal state via `Arc`, so clones
/// observe the same underlying store.
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Look an object up by kind and guid.
    ///
    /// Returns `Ok(None)` when no such object exists. Absence is a
    /// normal answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying storage fails.
    fn find(&self, kind: ObjectKind, guid: &Guid) -> Result<Option<ObjectRecord>, StoreError>;

    /// Persist a received object, overwriting any record with the same
    /// kind and guid.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying storage fails.
    fn insert(&self, record: ObjectRecord) -> Result<(), StoreError>;

    /// Delete an object by kind and guid.
    ///
    /// Idempotent: returns `Ok(true)` when a record was removed and
    /// `Ok(false)` when it was already absent (a benign no-op, never an
    /// error; last-delete-wins).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying storage fails.
    fn delete(&self, kind: ObjectKind, guid: &Guid) -> Result<bool, StoreError>;
}
