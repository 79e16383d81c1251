//! Wire types for the Petrel federation protocol.
//!
//! This crate defines the data that crosses pod boundaries: the signed
//! [`SignedEnvelope`] carrying an opaque embedded message, and the closed
//! [`Message`] set that the embedded bytes parse into once the envelope's
//! signature has been verified.
//!
//! The crate is deliberately free of key material and I/O. Structural
//! decoding lives here; signature verification and dispatch live in
//! `petrel-core`, which is the only place allowed to decide whether an
//! envelope's content may be trusted.
//!
//! # Two-stage decoding
//!
//! Decoding is split to match the trust boundary:
//!
//! 1. [`SignedEnvelope::decode`]: structural only. Failure means the raw
//!    bytes are not an envelope at all ([`ProtocolError::EnvelopeMalformed`]).
//! 2. [`Message::decode`]: typed, performed only *after* the signature
//!    over the embedded bytes has been verified. Failure here is
//!    [`ProtocolError::NotParseable`], a distinct trust failure: the sender
//!    proved key possession but sent something we cannot interpret.

mod envelope;
mod errors;
mod handle;
mod message;

pub use envelope::SignedEnvelope;
pub use errors::{ProtocolError, Result};
pub use handle::{Guid, Handle, PrincipalId};
pub use message::{Comment, Message, ObjectKind, Post, Profile, RetractionData, Visibility};
