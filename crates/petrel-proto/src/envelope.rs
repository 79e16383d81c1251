//! Signed wire envelope.
//!
//! Every inbound federation payload arrives as a [`SignedEnvelope`]: a
//! claimed sender handle, the still-opaque embedded message bytes, and a
//! detached Ed25519 signature over exactly those bytes.
//!
//! # Security
//!
//! Decoding provides structural validity only. A decoded envelope proves
//! nothing about its sender: the signature must be verified against the
//! claimed sender's public key (in `petrel-core`) before the embedded
//! message is parsed, persisted, or used for any authorization decision.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};
use crate::handle::Handle;

/// A parsed, signed wire payload carrying an embedded message and a
/// detachable signature.
///
/// Immutable once constructed; the receive pipeline discards it when the
/// operation completes or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// Handle of the principal claiming to have signed this envelope.
    ///
    /// Unauthenticated until the signature is verified against the public
    /// key this handle resolves to.
    pub sender: Handle,

    /// The embedded message, still opaque CBOR. This is exactly the byte
    /// range the signature covers.
    pub message: Bytes,

    /// Detached Ed25519 signature over `message`.
    pub signature: Vec<u8>,
}

impl SignedEnvelope {
    /// Assemble an envelope from its parts (outbound path; the signature
    /// is produced by the caller, typically `petrel-core`).
    #[must_use]
    pub fn new(sender: Handle, message: impl Into<Bytes>, signature: Vec<u8>) -> Self {
        Self { sender, message: message.into(), signature }
    }

    /// Decode an envelope from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EnvelopeMalformed`] if the bytes are not a
    /// CBOR envelope. Never panics on arbitrary input.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        ciborium::de::from_reader(raw)
            .map_err(|err| ProtocolError::EnvelopeMalformed(err.to_string()))
    }

    /// Encode the envelope for the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EnvelopeMalformed`] if serialization fails
    /// (cannot happen for well-formed envelopes; kept as an error rather
    /// than a panic per workspace policy).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|err| ProtocolError::EnvelopeMalformed(err.to_string()))?;
        Ok(buf)
    }

    /// The exact bytes the signature covers.
    #[must_use]
    pub fn signing_data(&self) -> &[u8] {
        &self.message
    }
}
