//! Lookup collaborators: keys, local principals, subscriptions.
//!
//! These traits are the seams between the pipeline and the pod's account
//! database. Everything is synchronous and returns owned values; how the
//! answers are computed (SQL, cache, flat file) is the embedder's concern.
//! [`MemoryDirectory`] is a shared-state reference implementation of all
//! three, for tests and small deployments.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ed25519_dalek::VerifyingKey;
use petrel_proto::{Guid, Handle, PrincipalId};

use crate::store::ObjectRecord;

/// Resolution of a remote sender's public key.
///
/// Discovery (webfinger, key exchange) is out of scope; by the time the
/// pipeline runs, the key is either locally known or it is not. An
/// unknown key makes the envelope unverifiable, which the receiver treats
/// exactly like a bad signature.
pub trait KeyDirectory: Send + Sync {
    /// The verifying key for a handle, if this pod knows one.
    fn public_key_for(&self, handle: &Handle) -> Option<VerifyingKey>;
}

/// Index of principals local to this pod.
pub trait PrincipalIndex: Send + Sync {
    /// Every local principal that shares with (subscribes to) the given
    /// remote sender. The fan-out set for public messages.
    fn principals_sharing_with(&self, sender: &Handle) -> Vec<PrincipalId>;

    /// The local principal a handle resolves to, if the handle is local
    /// to this pod.
    fn local_principal(&self, handle: &Handle) -> Option<PrincipalId>;
}

/// Index of per-object subscriber and re-sharer sets.
pub trait SubscriptionIndex: Send + Sync {
    /// Principals who receive updates about the object.
    fn subscribers_of(&self, object: &ObjectRecord) -> HashSet<PrincipalId>;

    /// Principals who propagated the object further. A subset of the
    /// audience, tracked separately because retraction semantics treat
    /// them differently.
    fn resharers_of(&self, object: &ObjectRecord) -> HashSet<PrincipalId>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    keys: HashMap<Handle, VerifyingKey>,
    locals: HashMap<Handle, PrincipalId>,
    sharing: HashMap<Handle, Vec<PrincipalId>>,
    subscribers: HashMap<Guid, HashSet<PrincipalId>>,
    resharers: HashMap<Guid, HashSet<PrincipalId>>,
}

/// In-memory implementation of all three lookup traits.
///
/// Clones share state via `Arc`, so a directory can be registered into
/// from one handle and queried through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a remote sender's public key.
    pub fn register_key(&self, handle: Handle, key: VerifyingKey) {
        self.lock().keys.insert(handle, key);
    }

    /// Register a principal as local to this pod.
    pub fn register_local(&self, handle: Handle, principal: PrincipalId) {
        self.lock().locals.insert(handle, principal);
    }

    /// Record that a local principal shares with a remote sender.
    pub fn add_sharer(&self, sender: Handle, principal: PrincipalId) {
        self.lock().sharing.entry(sender).or_default().push(principal);
    }

    /// Record a subscriber of an object.
    pub fn add_subscriber(&self, guid: Guid, principal: PrincipalId) {
        self.lock().subscribers.entry(guid).or_default().insert(principal);
    }

    /// Record a re-sharer of an object.
    pub fn add_resharer(&self, guid: Guid, principal: PrincipalId) {
        self.lock().resharers.entry(guid).or_default().insert(principal);
    }
}

impl KeyDirectory for MemoryDirectory {
    fn public_key_for(&self, handle: &Handle) -> Option<VerifyingKey> {
        self.lock().keys.get(handle).copied()
    }
}

impl PrincipalIndex for MemoryDirectory {
    fn principals_sharing_with(&self, sender: &Handle) -> Vec<PrincipalId> {
        self.lock().sharing.get(sender).cloned().unwrap_or_default()
    }

    fn local_principal(&self, handle: &Handle) -> Option<PrincipalId> {
        self.lock().locals.get(handle).copied()
    }
}

impl SubscriptionIndex for MemoryDirectory {
    fn subscribers_of(&self, object: &ObjectRecord) -> HashSet<PrincipalId> {
        self.lock().subscribers.get(&object.guid).cloned().unwrap_or_default()
    }

    fn resharers_of(&self, object: &ObjectRecord) -> HashSet<PrincipalId> {
        self.lock().resharers.get(&object.guid).cloned().unwrap_or_default()
    }
}
