//! Protocol error types.
//!
//! Two failure stages, kept distinct on purpose: an envelope that does not
//! decode at all, and an embedded message that does not match any known
//! schema. They happen at different trust levels (the second only after a
//! signature check) and callers treat them differently.

use thiserror::Error;

/// Convenience alias for protocol-layer results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Raw bytes do not decode into a signed envelope.
    ///
    /// Fatal to the receive attempt: with no envelope there is no claimed
    /// sender and no signature, so nothing further can be done.
    #[error("malformed envelope: {0}")]
    EnvelopeMalformed(String),

    /// The embedded message does not match any known message schema.
    ///
    /// In the receive pipeline this is only raised *after* the envelope
    /// signature verified, which makes it a noteworthy event: either a
    /// protocol version mismatch or a malicious signer.
    #[error("message not parseable: {0}")]
    NotParseable(String),
}
