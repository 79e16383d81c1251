//! Envelope signature verification.
//!
//! Lightweight check performed before anything else in the pipeline:
//! Ed25519 over exactly the envelope's embedded message bytes. The verdict
//! is a boolean, never an error. A malformed signature and a failed
//! verification are the same non-event to the caller, and neither leaks
//! detail toward the sender.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use petrel_proto::{Handle, SignedEnvelope};

/// Envelope signature verifier.
///
/// Pure and side-effect free: the verdict is a function of
/// (embedded message bytes, signature bytes, sender public key).
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Verify the envelope's signature under the claimed sender's key.
    ///
    /// Returns `false` for a bad signature, and also for signature bytes
    /// that are not even a well-formed Ed25519 signature. Never panics.
    #[must_use]
    pub fn verify(envelope: &SignedEnvelope, sender_key: &VerifyingKey) -> bool {
        let Ok(signature) = Signature::from_slice(&envelope.signature) else {
            return false;
        };

        sender_key.verify(envelope.signing_data(), &signature).is_ok()
    }
}

/// Sign embedded message bytes into an outbound envelope.
///
/// Used for locally originated traffic (e.g. retraction fan-out) and by
/// tests that need validly signed input.
#[must_use]
pub fn sign_envelope(
    sender: Handle,
    message: impl Into<bytes::Bytes>,
    key: &SigningKey,
) -> SignedEnvelope {
    let message = message.into();
    let signature = key.sign(&message);
    SignedEnvelope::new(sender, message, signature.to_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> (SigningKey, VerifyingKey) {
        let signing = SigningKey::generate(&mut rand::thread_rng());
        let verifying = signing.verifying_key();
        (signing, verifying)
    }

    #[test]
    fn valid_signature_verifies() {
        let (signing, verifying) = keypair();
        let envelope = sign_envelope(Handle::new("alice@pod.example"), &b"payload"[..], &signing);

        assert!(SignatureVerifier::verify(&envelope, &verifying));
    }

    #[test]
    fn wrong_key_fails() {
        let (signing, _) = keypair();
        let (_, other_verifying) = keypair();
        let envelope = sign_envelope(Handle::new("alice@pod.example"), &b"payload"[..], &signing);

        assert!(!SignatureVerifier::verify(&envelope, &other_verifying));
    }

    #[test]
    fn tampered_message_fails() {
        let (signing, verifying) = keypair();
        let mut envelope =
            sign_envelope(Handle::new("alice@pod.example"), &b"payload"[..], &signing);
        envelope.message = bytes::Bytes::from_static(b"tampered");

        assert!(!SignatureVerifier::verify(&envelope, &verifying));
    }

    #[test]
    fn malformed_signature_bytes_fail_without_panic() {
        let (_, verifying) = keypair();
        let envelope =
            SignedEnvelope::new(Handle::new("alice@pod.example"), &b"payload"[..], vec![1, 2, 3]);

        assert!(!SignatureVerifier::verify(&envelope, &verifying));
    }
}
