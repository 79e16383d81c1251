//! Error types for the receive pipeline.
//!
//! One deliberate absence: there is no "signature invalid" variant. An
//! unverifiable signature is a boolean verdict that terminates the
//! pipeline in a silent [`crate::Outcome::Rejected`], never an error.
//! Errors carry detail, and authenticity failures must not.

use petrel_proto::{Guid, Handle, ProtocolError};
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::retraction::RetractionError;
use crate::store::StoreError;

/// Errors surfaced to the caller of the receive pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// Raw bytes did not decode into an envelope. Fails construction of
    /// the [`crate::Receiver`] itself.
    #[error("malformed envelope: {0}")]
    Envelope(String),

    /// The embedded message was unparsable despite a valid signature.
    ///
    /// Surfaced rather than dropped: a validly-signed-but-malformed
    /// message means a protocol version mismatch or a malicious signer,
    /// and the operator decides what to do about it.
    #[error("message not parseable: {0}")]
    NotParseable(String),

    /// The verified sender is not an authorized author or delegate of the
    /// retraction target.
    #[error("retraction of {guid} not authorized for {sender}")]
    AuthorizationDenied {
        /// Verified sender that claimed authority.
        sender: Handle,
        /// Target the retraction named.
        guid: Guid,
    },

    /// Object store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Delivery work could not be enqueued. Distinct from delivery
    /// failure, which happens outside this core.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Retraction processing failed.
    #[error("retraction error: {0}")]
    Retraction(#[from] RetractionError),
}

impl From<ProtocolError> for ReceiveError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::EnvelopeMalformed(reason) => Self::Envelope(reason),
            ProtocolError::NotParseable(reason) => Self::NotParseable(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_map_to_their_stage() {
        let envelope: ReceiveError = ProtocolError::EnvelopeMalformed("bad".to_string()).into();
        assert!(matches!(envelope, ReceiveError::Envelope(_)));

        let message: ReceiveError = ProtocolError::NotParseable("bad".to_string()).into();
        assert!(matches!(message, ReceiveError::NotParseable(_)));
    }

    #[test]
    fn authorization_denied_names_sender_and_target() {
        let err = ReceiveError::AuthorizationDenied {
            sender: Handle::new("mallory@evil.example"),
            guid: Guid::new("g1"),
        };
        assert_eq!(err.to_string(), "retraction of g1 not authorized for mallory@evil.example");
    }
}
