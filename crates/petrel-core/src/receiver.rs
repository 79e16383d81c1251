//! Receive pipeline orchestration.
//!
//! The [`Receiver`] drives one inbound payload through a strict forward
//! pipeline:
//!
//! ```text
//! Received → EnvelopeParsed → SignatureChecked → MessageParsed
//!          → Dispatched → Complete        (Rejected terminal on failure)
//! ```
//!
//! Construction parses the envelope immediately: a payload that is not
//! even an envelope fails before a `Receiver` exists. `perform` then
//! verifies, parses, and dispatches. There are no backward transitions
//! and no second `perform`.
//!
//! # Security
//!
//! Verification strictly precedes any use of message content. On an
//! unverifiable envelope the pipeline stops with a silent
//! [`Outcome::Rejected`]: no parse, no persistence, no dispatch, and no
//! logging of content. A remote sender learns nothing about this pod
//! from an envelope it could not sign.

use petrel_proto::{Comment, Guid, Message, ObjectKind, Profile, RetractionData, SignedEnvelope};
use tracing::{debug, warn};

use crate::directory::{KeyDirectory, PrincipalIndex, SubscriptionIndex};
use crate::dispatch::{DeliveryJob, WorkQueue};
use crate::error::ReceiveError;
use crate::recipients::RecipientResolver;
use crate::retraction::Retraction;
use crate::store::{ObjectRecord, ObjectStore, ParentRef};
use crate::verify::SignatureVerifier;

/// Pipeline states, in order. No backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReceiverState {
    /// Raw bytes accepted, nothing parsed yet. Only observable inside
    /// construction; `new` either advances past it or fails.
    Received,
    /// Envelope decoded; sender claim and signature available.
    EnvelopeParsed,
    /// Signature verified against the claimed sender's key.
    SignatureChecked,
    /// Embedded message parsed into a typed variant.
    MessageParsed,
    /// Delivery work submitted (or retraction applied).
    Dispatched,
    /// Pipeline finished successfully.
    Complete,
    /// Terminal failure state, reachable from any prior state.
    Rejected,
}

/// What a completed pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Envelope could not be verified (unknown key or bad signature).
    /// Silent by protocol requirement: nothing was parsed or dispatched.
    Rejected,

    /// A relayable message whose parent is unknown here or authored
    /// remotely. This pod is not the authority; nothing was dispatched.
    NotAuthoritative,

    /// A retraction was processed (including the benign case of a target
    /// already gone).
    Retracted,

    /// The message was persisted and delivery work submitted.
    Dispatched {
        /// How many local principals the work addresses.
        recipients: usize,
    },
}

/// Orchestrator for one inbound payload.
///
/// Owns the parsed envelope for the duration of one receive operation;
/// collaborators are injected at construction.
pub struct Receiver<K, P, S, X, Q>
where
    K: KeyDirectory,
    P: PrincipalIndex,
    S: ObjectStore,
    X: SubscriptionIndex,
    Q: WorkQueue,
{
    envelope: SignedEnvelope,
    keys: K,
    principals: P,
    store: S,
    #[allow(dead_code)]
    subscriptions: X,
    queue: Q,
    state: ReceiverState,
}

impl<K, P, S, X, Q> Receiver<K, P, S, X, Q>
where
    K: KeyDirectory,
    P: PrincipalIndex,
    S: ObjectStore,
    X: SubscriptionIndex,
    Q: WorkQueue,
{
    /// Construct a receiver from raw bytes, parsing the envelope
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Envelope`] if the bytes are not an
    /// envelope: a hard failure of construction, no `Receiver` exists
    /// afterwards.
    pub fn new(
        raw: &[u8],
        keys: K,
        principals: P,
        store: S,
        subscriptions: X,
        queue: Q,
    ) -> Result<Self, ReceiveError> {
        let envelope = SignedEnvelope::decode(raw)?;
        Ok(Self {
            envelope,
            keys,
            principals,
            store,
            subscriptions,
            queue,
            state: ReceiverState::EnvelopeParsed,
        })
    }

    /// Current pipeline state.
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// The parsed envelope. Its content is untrusted until `perform`
    /// verifies the signature.
    #[must_use]
    pub fn envelope(&self) -> &SignedEnvelope {
        &self.envelope
    }

    fn advance(&mut self, next: ReceiverState) {
        debug_assert!(self.state < next, "pipeline never moves backward");
        self.state = next;
    }

    /// Run the pipeline: verify, parse, dispatch.
    ///
    /// # Errors
    ///
    /// - [`ReceiveError::NotParseable`]: signature valid but embedded
    ///   content unparsable; surfaced, never silently dropped.
    /// - [`ReceiveError::AuthorizationDenied`]: a retraction from a
    ///   verified sender who is not the target's author or delegate.
    /// - [`ReceiveError::Store`] / [`ReceiveError::Dispatch`] /
    ///   [`ReceiveError::Retraction`]: collaborator failures.
    ///
    /// An unverifiable signature is NOT an error: it terminates with
    /// `Ok(Outcome::Rejected)` and no further action.
    pub fn perform(&mut self) -> Result<Outcome, ReceiveError> {
        let Some(sender_key) = self.keys.public_key_for(&self.envelope.sender) else {
            self.advance(ReceiverState::Rejected);
            debug!(sender = %self.envelope.sender, "rejecting envelope: no key for sender");
            return Ok(Outcome::Rejected);
        };

        if !SignatureVerifier::verify(&self.envelope, &sender_key) {
            self.advance(ReceiverState::Rejected);
            debug!(sender = %self.envelope.sender, "rejecting envelope: signature invalid");
            return Ok(Outcome::Rejected);
        }
        self.advance(ReceiverState::SignatureChecked);

        let message = match Message::decode(self.envelope.signing_data()) {
            Ok(message) => message,
            Err(err) => {
                self.advance(ReceiverState::Rejected);
                warn!(sender = %self.envelope.sender, %err, "verified envelope with unparsable message");
                return Err(err.into());
            },
        };
        self.advance(ReceiverState::MessageParsed);

        let outcome = match message {
            Message::Comment(comment) => self.receive_relayable(comment)?,
            Message::Retraction(data) => self.receive_retraction(data)?,
            top_level @ (Message::Post(_) | Message::Profile(_)) => {
                self.receive_top_level(top_level)?
            },
        };

        self.advance(ReceiverState::Complete);
        Ok(outcome)
    }

    /// Relayable path: this pod acts only if the parent object's author
    /// is local, in which case the single delivery target is that author.
    fn receive_relayable(&mut self, comment: Comment) -> Result<Outcome, ReceiveError> {
        let Some(parent) = self.find_parent(&comment.parent_guid)? else {
            debug!(guid = %comment.guid, "relayable with unknown parent, not our authority");
            return Ok(Outcome::NotAuthoritative);
        };

        let Some(author_id) = self.principals.local_principal(&parent.author) else {
            debug!(guid = %comment.guid, "relayable parent authored remotely, not our authority");
            return Ok(Outcome::NotAuthoritative);
        };

        self.store.insert(ObjectRecord {
            kind: ObjectKind::Comment,
            guid: comment.guid.clone(),
            author: comment.author.clone(),
            parent: Some(ParentRef { guid: parent.guid, author: parent.author }),
        })?;

        self.queue.submit(DeliveryJob::RelayToAuthor {
            message: Message::Comment(comment),
            author: author_id,
            sender: self.envelope.sender.clone(),
        })?;
        self.advance(ReceiverState::Dispatched);

        Ok(Outcome::Dispatched { recipients: 1 })
    }

    /// Look a relayable's parent up across the kinds that can carry
    /// children. Guids are globally unique, so at most one kind matches.
    fn find_parent(&self, guid: &Guid) -> Result<Option<ObjectRecord>, ReceiveError> {
        for kind in [ObjectKind::Post, ObjectKind::Photo] {
            if let Some(record) = self.store.find(kind, guid)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Retraction path. Authorization is checked here, against the
    /// *verified* envelope sender: a mandatory pipeline step, not a
    /// courtesy left to callers.
    fn receive_retraction(&mut self, data: RetractionData) -> Result<Outcome, ReceiveError> {
        let mut retraction = Retraction::from_wire(data);

        if retraction.resolve_target(&self.store)?.is_none() {
            // Already gone (or never seen): benign no-op, perform issues
            // no delete.
            retraction.perform(&self.store)?;
            self.advance(ReceiverState::Dispatched);
            return Ok(Outcome::Retracted);
        }

        if !retraction.is_authorized(&self.envelope.sender) {
            self.advance(ReceiverState::Rejected);
            return Err(ReceiveError::AuthorizationDenied {
                sender: self.envelope.sender.clone(),
                guid: retraction.target_guid().clone(),
            });
        }

        retraction.perform(&self.store)?;
        self.advance(ReceiverState::Dispatched);
        Ok(Outcome::Retracted)
    }

    /// Top-level path: resolve recipients by declared visibility, persist
    /// the object, submit one batched delivery.
    fn receive_top_level(&mut self, message: Message) -> Result<Outcome, ReceiveError> {
        let mut recipients: Vec<_> =
            RecipientResolver::resolve(&message, &self.principals).into_iter().collect();
        recipients.sort_unstable();

        self.store.insert(record_for(&message))?;

        let count = recipients.len();
        self.queue.submit(DeliveryJob::LocalBatch {
            message,
            recipients,
            sender: self.envelope.sender.clone(),
        })?;
        self.advance(ReceiverState::Dispatched);

        debug!(recipients = count, "dispatched batched local delivery");
        Ok(Outcome::Dispatched { recipients: count })
    }
}

/// Storage record for a top-level message.
fn record_for(message: &Message) -> ObjectRecord {
    let kind = match message {
        Message::Profile(Profile { .. }) => ObjectKind::Person,
        // Comments are persisted on the relayable path with their parent
        // reference; retractions are never persisted.
        Message::Post(_) | Message::Comment(_) | Message::Retraction(_) => ObjectKind::Post,
    };
    ObjectRecord {
        kind,
        guid: message.guid().clone(),
        author: message.author().clone(),
        parent: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_strictly_ordered() {
        assert!(ReceiverState::Received < ReceiverState::EnvelopeParsed);
        assert!(ReceiverState::EnvelopeParsed < ReceiverState::SignatureChecked);
        assert!(ReceiverState::SignatureChecked < ReceiverState::MessageParsed);
        assert!(ReceiverState::MessageParsed < ReceiverState::Dispatched);
        assert!(ReceiverState::Dispatched < ReceiverState::Complete);
        assert!(ReceiverState::Complete < ReceiverState::Rejected);
    }
}
