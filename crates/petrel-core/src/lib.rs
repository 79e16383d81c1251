//! Receive pipeline for the Petrel federation protocol.
//!
//! This crate turns a raw signed payload from a remote pod into local
//! effects: verifying the envelope signature, parsing the embedded message,
//! working out which local principals it concerns, dispatching delivery
//! work, and processing retractions that propagate deletion of a
//! previously federated object.
//!
//! # Architecture
//!
//! ```text
//! Receiver (receiver.rs)
//!   ├─ keys: K (impl KeyDirectory)          - sender public keys
//!   ├─ principals: P (impl PrincipalIndex)  - local accounts and sharing
//!   ├─ store: S (impl ObjectStore)          - federated object persistence
//!   ├─ subscriptions: X (impl SubscriptionIndex)
//!   └─ queue: Q (impl WorkQueue)            - async delivery hand-off
//! ```
//!
//! The core is sans-IO and fully synchronous: collaborators are injected
//! traits, signature checks and parsing are CPU-bound, and the only
//! concurrency boundary is the fire-and-forget [`WorkQueue::submit`] at
//! the end of a successful pipeline run.
//!
//! # Security invariant
//!
//! Signature verification strictly precedes any use of message content.
//! An envelope that cannot be verified (unknown sender key or bad
//! signature) is rejected silently: no parse, no persistence, no
//! dispatch, and no detail leaked back toward the sender.

pub mod directory;
pub mod dispatch;
pub mod error;
pub mod receiver;
pub mod recipients;
pub mod retraction;
pub mod store;
pub mod verify;

pub use directory::{KeyDirectory, MemoryDirectory, PrincipalIndex, SubscriptionIndex};
pub use dispatch::{DeliveryJob, DispatchError, MemoryQueue, WorkQueue};
pub use error::ReceiveError;
pub use receiver::{Outcome, Receiver, ReceiverState};
pub use recipients::RecipientResolver;
pub use retraction::{Retraction, RetractionError, SubscriberSet};
pub use store::{MemoryStore, ObjectRecord, ObjectStore, ParentRef, StoreError};
pub use verify::{SignatureVerifier, sign_envelope};
