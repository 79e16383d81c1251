//! Property-based tests for wire decoding.
//!
//! The decoders face unauthenticated input (the envelope) and
//! authenticated-but-untrusted input (the embedded message), so the
//! properties that matter are robustness ones: arbitrary bytes must
//! produce typed errors, never panics, and well-formed data must survive a
//! round trip unchanged.

use bytes::Bytes;
use petrel_proto::{Guid, Handle, Message, Post, SignedEnvelope, Visibility};
use proptest::prelude::*;

/// Strategy for generating arbitrary handles (printable, with an @).
fn arbitrary_handle() -> impl Strategy<Value = Handle> {
    ("[a-z]{1,16}", "[a-z]{1,12}\\.[a-z]{2,4}")
        .prop_map(|(user, pod)| Handle::new(format!("{user}@{pod}")))
}

fn arbitrary_post() -> impl Strategy<Value = Message> {
    (
        arbitrary_handle(),
        "[a-f0-9]{16}",
        prop_oneof![
            Just(Visibility::Public),
            prop::collection::vec(arbitrary_handle(), 0..4)
                .prop_map(|recipients| Visibility::Private { recipients }),
        ],
        ".{0,256}",
    )
        .prop_map(|(author, guid, visibility, body)| {
            Message::Post(Post { author, guid: Guid::new(guid), visibility, body })
        })
}

#[test]
fn prop_envelope_decode_never_panics() {
    proptest!(|(raw in prop::collection::vec(any::<u8>(), 0..512))| {
        // Any outcome is fine as long as it is a value, not a panic.
        let _ = SignedEnvelope::decode(&raw);
    });
}

#[test]
fn prop_message_decode_never_panics() {
    proptest!(|(raw in prop::collection::vec(any::<u8>(), 0..512))| {
        let _ = Message::decode(&raw);
    });
}

#[test]
fn prop_envelope_roundtrip() {
    proptest!(|(
        sender in arbitrary_handle(),
        message in prop::collection::vec(any::<u8>(), 0..256),
        signature in prop::collection::vec(any::<u8>(), 64..=64),
    )| {
        let envelope = SignedEnvelope::new(sender, Bytes::from(message), signature);
        let raw = envelope.encode().expect("encode should succeed");
        let decoded = SignedEnvelope::decode(&raw).expect("decode should succeed");

        prop_assert_eq!(decoded, envelope);
    });
}

#[test]
fn prop_post_roundtrip() {
    proptest!(|(message in arbitrary_post())| {
        let raw = message.encode().expect("encode should succeed");
        let decoded = Message::decode(&raw).expect("decode should succeed");

        prop_assert_eq!(decoded, message);
    });
}
