//! Retraction processing.
//!
//! A retraction propagates deletion of a previously federated object to
//! its subscribers. It is built in one of two directions: outbound, from
//! a deletion event on a local object (or an account closure), and
//! inbound, from a verified wire message. Either way the same rules
//! apply: the target resolves lazily and at most once, the subscriber set
//! is derived from the target (with a manual-override point for the
//! Person case), and authorization is a pure predicate the orchestration
//! layer must check before `perform` deletes anything.

use std::collections::HashSet;

use petrel_proto::{Guid, Handle, ObjectKind, PrincipalId, RetractionData};
use thiserror::Error;
use tracing::{debug, info};

use crate::directory::SubscriptionIndex;
use crate::store::{ObjectRecord, ObjectStore, StoreError};

/// Errors from retraction processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetractionError {
    /// A Person retraction was asked for its subscribers before they were
    /// supplied. There is no derivation rule for unfriend events; failing
    /// to call [`Retraction::set_subscribers`] first is a caller bug.
    #[error("person retraction requires subscribers to be set manually")]
    SubscribersUnset,

    /// Subscriber derivation needs a resolved target and there is none:
    /// either `resolve_target` was never called or the target is gone.
    #[error("retraction target {0} is not resolved")]
    TargetUnresolved(Guid),

    /// Object store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The subscriber set of a retraction: explicitly two-state, so reading
/// before computation (or before the Person-case override) is an error
/// rather than a silent empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubscriberSet {
    /// Not yet derived or supplied.
    #[default]
    Unset,
    /// Derived from the target, or supplied via override. Memoized.
    Computed(HashSet<PrincipalId>),
}

/// Cached result of target resolution. `Absent` is remembered so a
/// retraction of an already-deleted object stays a cheap no-op and
/// `perform` is never tempted to look the target up twice.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetState {
    Unresolved,
    Absent,
    Resolved(ObjectRecord),
}

/// A retraction of one federated object, inbound or outbound.
///
/// Consumed once by [`perform`](Self::perform): the target, once deleted,
/// cannot be re-resolved, so derive subscribers *before* performing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retraction {
    target_kind: ObjectKind,
    target_guid: Guid,
    sender: Handle,
    target: TargetState,
    subscribers: SubscriberSet,
}

impl Retraction {
    /// Build an outbound retraction for a local object's deletion.
    ///
    /// Kind, guid and sender are copied from the record, and the record
    /// itself is kept as the already-resolved target.
    #[must_use]
    pub fn for_object(record: &ObjectRecord) -> Self {
        Self {
            target_kind: record.kind,
            target_guid: record.guid.clone(),
            sender: record.author.clone(),
            target: TargetState::Resolved(record.clone()),
            subscribers: SubscriberSet::Unset,
        }
    }

    /// Build an outbound retraction for an account closure (a principal
    /// removing their identity).
    ///
    /// No object reference is kept, and the subscriber set must be
    /// supplied via [`set_subscribers`](Self::set_subscribers) before use.
    #[must_use]
    pub fn for_account_closure(person_guid: Guid, handle: Handle) -> Self {
        Self {
            target_kind: ObjectKind::Person,
            target_guid: person_guid,
            sender: handle,
            target: TargetState::Unresolved,
            subscribers: SubscriberSet::Unset,
        }
    }

    /// Build an inbound retraction from a verified wire message.
    #[must_use]
    pub fn from_wire(data: RetractionData) -> Self {
        Self {
            target_kind: data.target_kind,
            target_guid: data.target_guid,
            sender: data.sender,
            target: TargetState::Unresolved,
            subscribers: SubscriberSet::Unset,
        }
    }

    /// Kind of the object being retracted.
    #[must_use]
    pub fn target_kind(&self) -> ObjectKind {
        self.target_kind
    }

    /// Guid of the object being retracted.
    #[must_use]
    pub fn target_guid(&self) -> &Guid {
        &self.target_guid
    }

    /// Handle claiming authority for this retraction.
    #[must_use]
    pub fn sender(&self) -> &Handle {
        &self.sender
    }

    /// The wire form of this retraction, for outbound federation.
    #[must_use]
    pub fn wire_data(&self) -> RetractionData {
        RetractionData {
            target_kind: self.target_kind,
            target_guid: self.target_guid.clone(),
            sender: self.sender.clone(),
        }
    }

    /// Resolve the target object by (kind, guid), caching the answer.
    ///
    /// Idempotent before [`perform`](Self::perform): repeated calls hit
    /// the cache and return the same record. An absent target is
    /// `Ok(None)`, never an error: retracting something already gone is
    /// normal federation weather.
    ///
    /// # Errors
    ///
    /// Returns [`RetractionError::Store`] if the lookup itself fails.
    pub fn resolve_target(
        &mut self,
        store: &impl ObjectStore,
    ) -> Result<Option<&ObjectRecord>, RetractionError> {
        if self.target == TargetState::Unresolved {
            self.target = match store.find(self.target_kind, &self.target_guid)? {
                Some(record) => TargetState::Resolved(record),
                None => TargetState::Absent,
            };
        }

        Ok(self.target())
    }

    /// The resolved target, if resolution found one.
    #[must_use]
    pub fn target(&self) -> Option<&ObjectRecord> {
        match &self.target {
            TargetState::Resolved(record) => Some(record),
            TargetState::Unresolved | TargetState::Absent => None,
        }
    }

    /// Whether `claimed` holds authority to retract the resolved target.
    ///
    /// For a relayable target the authority is delegated: either the
    /// target's own author or the parent's author qualifies. For anything
    /// else only the target's author does. With no resolved target the
    /// answer is `false`.
    ///
    /// This is a pure predicate; it is the orchestration layer's job to
    /// check it before calling [`perform`](Self::perform).
    #[must_use]
    pub fn is_authorized(&self, claimed: &Handle) -> bool {
        let Some(target) = self.target() else {
            return false;
        };

        match &target.parent {
            Some(parent) => claimed == &target.author || claimed == &parent.author,
            None => claimed == &target.author,
        }
    }

    /// Supply the subscriber set explicitly.
    ///
    /// The intended use is the Person (unfriend / account closure) case,
    /// where no derivation rule exists; it also overrides the lazy
    /// derivation for any other kind.
    pub fn set_subscribers(&mut self, subscribers: HashSet<PrincipalId>) {
        self.subscribers = SubscriberSet::Computed(subscribers);
    }

    /// The principals to notify of this retraction.
    ///
    /// For non-Person targets the set is derived lazily from the resolved
    /// target and memoized after the first computation: its subscribers
    /// minus its re-sharers, except that media attachments keep
    /// re-sharers in.
    ///
    /// # Errors
    ///
    /// - [`RetractionError::SubscribersUnset`] for a Person retraction
    ///   whose set was never supplied.
    /// - [`RetractionError::TargetUnresolved`] when derivation is needed
    ///   but the target was never resolved (or is already gone).
    pub fn subscribers(
        &mut self,
        subscriptions: &impl SubscriptionIndex,
    ) -> Result<&HashSet<PrincipalId>, RetractionError> {
        if self.subscribers == SubscriberSet::Unset {
            if self.target_kind == ObjectKind::Person {
                return Err(RetractionError::SubscribersUnset);
            }

            let Some(target) = self.target() else {
                return Err(RetractionError::TargetUnresolved(self.target_guid.clone()));
            };

            let mut set = subscriptions.subscribers_of(target);
            if !target.kind.is_media() {
                for resharer in subscriptions.resharers_of(target) {
                    set.remove(&resharer);
                }
            }

            self.subscribers = SubscriberSet::Computed(set);
        }

        match &self.subscribers {
            SubscriberSet::Computed(set) => Ok(set),
            // Unreachable: every path above either returned or assigned
            // Computed.
            SubscriberSet::Unset => {
                Err(RetractionError::TargetUnresolved(self.target_guid.clone()))
            },
        }
    }

    /// Delete the resolved target and report completion.
    ///
    /// A missing target (never resolved, or already gone) is a successful
    /// no-op that issues no delete call. Not safely re-entrant with an
    /// expectation of re-deriving subscribers afterwards: once deleted,
    /// the target cannot be resolved again.
    ///
    /// # Errors
    ///
    /// Returns [`RetractionError::Store`] if the delete itself fails.
    pub fn perform(&mut self, store: &impl ObjectStore) -> Result<(), RetractionError> {
        debug!(guid = %self.target_guid, "performing retraction");

        if let TargetState::Resolved(record) = &self.target {
            store.delete(record.kind, &record.guid)?;
            self.target = TargetState::Absent;
        }

        info!(
            kind = self.target_kind.tag(),
            guid = %self.target_guid,
            "event=retraction status=complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use crate::store::{MemoryStore, ParentRef};

    fn alice() -> Handle {
        Handle::new("alice@pod.example")
    }

    fn post_record(guid: &str) -> ObjectRecord {
        ObjectRecord {
            kind: ObjectKind::Post,
            guid: Guid::new(guid),
            author: alice(),
            parent: None,
        }
    }

    #[test]
    fn for_object_copies_identity_and_keeps_target() {
        let record = post_record("g1");
        let retraction = Retraction::for_object(&record);

        assert_eq!(retraction.target_kind(), ObjectKind::Post);
        assert_eq!(retraction.target_guid(), &Guid::new("g1"));
        assert_eq!(retraction.sender(), &alice());
        assert_eq!(retraction.target(), Some(&record));
    }

    #[test]
    fn account_closure_targets_a_person_with_no_object() {
        let retraction = Retraction::for_account_closure(Guid::new("person-1"), alice());

        assert_eq!(retraction.target_kind(), ObjectKind::Person);
        assert!(retraction.target().is_none());
    }

    #[test]
    fn wire_data_round_trips_through_from_wire() {
        let retraction = Retraction::for_object(&post_record("g1"));
        let rebuilt = Retraction::from_wire(retraction.wire_data());

        assert_eq!(rebuilt.target_kind(), retraction.target_kind());
        assert_eq!(rebuilt.target_guid(), retraction.target_guid());
        assert_eq!(rebuilt.sender(), retraction.sender());
    }

    #[test]
    fn subscribers_before_resolution_is_an_error() {
        let directory = MemoryDirectory::new();
        let mut retraction = Retraction::from_wire(RetractionData {
            target_kind: ObjectKind::Post,
            target_guid: Guid::new("g1"),
            sender: alice(),
        });

        assert_eq!(
            retraction.subscribers(&directory),
            Err(RetractionError::TargetUnresolved(Guid::new("g1")))
        );
    }

    #[test]
    fn unresolved_target_is_never_authorized() {
        let retraction = Retraction::for_account_closure(Guid::new("person-1"), alice());
        assert!(!retraction.is_authorized(&alice()));
    }

    #[test]
    fn relayable_authorization_is_delegated() {
        let comment = ObjectRecord {
            kind: ObjectKind::Comment,
            guid: Guid::new("c1"),
            author: Handle::new("bob@other.example"),
            parent: Some(ParentRef { guid: Guid::new("g1"), author: alice() }),
        };
        let retraction = Retraction::for_object(&comment);

        assert!(retraction.is_authorized(&alice())); // parent author
        assert!(retraction.is_authorized(&Handle::new("bob@other.example"))); // own author
        assert!(!retraction.is_authorized(&Handle::new("carol@third.example")));
    }

    #[test]
    fn plain_authorization_is_author_only() {
        let retraction = Retraction::for_object(&post_record("g1"));

        assert!(retraction.is_authorized(&alice()));
        assert!(!retraction.is_authorized(&Handle::new("bob@other.example")));
    }

    #[test]
    fn perform_after_delete_cannot_rederive_subscribers() {
        let store = MemoryStore::new();
        let directory = MemoryDirectory::new();
        store.insert(post_record("g1")).unwrap();

        let mut retraction = Retraction::from_wire(RetractionData {
            target_kind: ObjectKind::Post,
            target_guid: Guid::new("g1"),
            sender: alice(),
        });
        retraction.resolve_target(&store).unwrap();
        retraction.perform(&store).unwrap();

        assert_eq!(
            retraction.subscribers(&directory),
            Err(RetractionError::TargetUnresolved(Guid::new("g1")))
        );
    }

    #[test]
    fn subscribers_computed_before_perform_stay_available() {
        let store = MemoryStore::new();
        let directory = MemoryDirectory::new();
        store.insert(post_record("g1")).unwrap();
        directory.add_subscriber(Guid::new("g1"), PrincipalId(1));

        let mut retraction = Retraction::for_object(&post_record("g1"));
        let before = retraction.subscribers(&directory).unwrap().clone();
        retraction.perform(&store).unwrap();

        // Memoized set survives the delete.
        assert_eq!(retraction.subscribers(&directory).unwrap(), &before);
    }
}
