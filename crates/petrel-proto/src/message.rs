//! Typed domain messages.
//!
//! The embedded bytes of a verified envelope parse into exactly one
//! variant of the closed [`Message`] set. The wire form is a small CBOR
//! map `{ kind, body }`; the `kind` tag is matched against an explicit
//! table and anything outside the table is [`ProtocolError::NotParseable`]
//! rather than an attempt at open-ended resolution.
//!
//! # Invariants
//!
//! - Each message variant maps to exactly one tag string, and each object
//!   kind to exactly one kind tag (enforced by exhaustive `match`).
//! - Adding a variant without extending the decode table is a compile
//!   error, never a silent drop.

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};
use crate::handle::{Guid, Handle};

/// Closed set of federated object kinds.
///
/// Drives both retraction target lookup and the kind-specific rules of
/// subscriber computation. Unknown kind tags are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A top-level post.
    Post,
    /// A comment on a post; relayable.
    Comment,
    /// A media attachment.
    Photo,
    /// A principal's identity itself (account closure / unfriend events).
    Person,
}

impl ObjectKind {
    /// The wire tag for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Photo => "photo",
            Self::Person => "person",
        }
    }

    /// Look a kind up by wire tag.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotParseable`] for tags outside the closed
    /// set.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            "photo" => Ok(Self::Photo),
            "person" => Ok(Self::Person),
            other => Err(ProtocolError::NotParseable(format!("unknown object kind: {other}"))),
        }
    }

    /// Whether authority over objects of this kind is delegated to the
    /// parent object's author.
    #[must_use]
    pub fn is_relayable(self) -> bool {
        matches!(self, Self::Comment)
    }

    /// Whether this kind is a media attachment. Media retractions notify
    /// re-sharers too; everything else excludes them.
    #[must_use]
    pub fn is_media(self) -> bool {
        matches!(self, Self::Photo)
    }
}

/// Visibility scope of a top-level message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Deliverable to every local principal sharing with the sender.
    Public,
    /// Deliverable only to the explicitly addressed handles.
    Private {
        /// Explicit addressee list carried in the message.
        recipients: Vec<Handle>,
    },
}

/// A top-level post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Origin handle of the post's author.
    pub author: Handle,
    /// Globally unique identifier.
    pub guid: Guid,
    /// Who may receive this post.
    pub visibility: Visibility,
    /// Post body text.
    pub body: String,
}

/// A comment on a post. Relayable: the parent post's author is the
/// federation authority for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Origin handle of the comment's own author.
    pub author: Handle,
    /// Globally unique identifier.
    pub guid: Guid,
    /// Guid of the parent object this comment replies to.
    pub parent_guid: Guid,
    /// Comment body text.
    pub body: String,
}

/// Wire form of a retraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetractionData {
    /// Kind of the object being retracted.
    pub target_kind: ObjectKind,
    /// Guid of the object being retracted.
    pub target_guid: Guid,
    /// Handle claiming authority to retract the target.
    pub sender: Handle,
}

/// A principal's profile record (the "Person" top-level message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The principal this profile describes.
    pub author: Handle,
    /// Globally unique identifier of the person record.
    pub guid: Guid,
}

/// All messages a verified envelope can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A top-level post.
    Post(Post),
    /// A relayable comment.
    Comment(Comment),
    /// A deletion request for a previously federated object.
    Retraction(RetractionData),
    /// A profile record.
    Profile(Profile),
}

/// Wire representation: a tag plus an opaque body decoded in a second step
/// so an unknown tag fails before any body deserialization is attempted.
#[derive(Serialize, Deserialize)]
struct WireMessage {
    kind: String,
    body: Value,
}

impl Message {
    /// The wire tag for this message.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Comment(_) => "comment",
            Self::Retraction(_) => "retraction",
            Self::Profile(_) => "profile",
        }
    }

    /// Origin handle of the message's author.
    #[must_use]
    pub fn author(&self) -> &Handle {
        match self {
            Self::Post(post) => &post.author,
            Self::Comment(comment) => &comment.author,
            Self::Retraction(retraction) => &retraction.sender,
            Self::Profile(profile) => &profile.author,
        }
    }

    /// Globally unique identifier carried by the message.
    #[must_use]
    pub fn guid(&self) -> &Guid {
        match self {
            Self::Post(post) => &post.guid,
            Self::Comment(comment) => &comment.guid,
            Self::Retraction(retraction) => &retraction.target_guid,
            Self::Profile(profile) => &profile.guid,
        }
    }

    /// Decode a message from verified embedded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotParseable`] when the bytes are not a
    /// tagged CBOR message, the tag is outside the closed set, or the body
    /// does not match the tagged schema. Never panics on arbitrary input.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let wire: WireMessage = ciborium::de::from_reader(raw)
            .map_err(|err| ProtocolError::NotParseable(err.to_string()))?;

        // Explicit tag table; reflective resolution is exactly what we
        // refuse to do with unauthenticated-schema input.
        match wire.kind.as_str() {
            "post" => decode_body(&wire.body).map(Self::Post),
            "comment" => decode_body(&wire.body).map(Self::Comment),
            "retraction" => decode_body(&wire.body).map(Self::Retraction),
            "profile" => decode_body(&wire.body).map(Self::Profile),
            other => Err(ProtocolError::NotParseable(format!("unknown message tag: {other}"))),
        }
    }

    /// Encode the message into embedded-message bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotParseable`] if serialization fails
    /// (cannot happen for well-formed messages).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = match self {
            Self::Post(post) => encode_body(post),
            Self::Comment(comment) => encode_body(comment),
            Self::Retraction(retraction) => encode_body(retraction),
            Self::Profile(profile) => encode_body(profile),
        }?;

        let wire = WireMessage { kind: self.tag().to_string(), body };
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&wire, &mut buf)
            .map_err(|err| ProtocolError::NotParseable(err.to_string()))?;
        Ok(buf)
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(body: &Value) -> Result<T> {
    body.deserialized().map_err(|err| ProtocolError::NotParseable(err.to_string()))
}

fn encode_body<T: Serialize>(body: &T) -> Result<Value> {
    Value::serialized(body).map_err(|err| ProtocolError::NotParseable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_post() -> Message {
        Message::Post(Post {
            author: Handle::new("alice@pod.example"),
            guid: Guid::new("post-1"),
            visibility: Visibility::Public,
            body: "hello fediverse".to_string(),
        })
    }

    #[test]
    fn post_roundtrip() {
        let message = public_post();
        let raw = message.encode().unwrap();
        assert_eq!(Message::decode(&raw).unwrap(), message);
    }

    #[test]
    fn comment_roundtrip_keeps_parent() {
        let message = Message::Comment(Comment {
            author: Handle::new("bob@other.example"),
            guid: Guid::new("comment-1"),
            parent_guid: Guid::new("post-1"),
            body: "yo".to_string(),
        });
        let raw = message.encode().unwrap();
        let decoded = Message::decode(&raw).unwrap();
        match decoded {
            Message::Comment(comment) => assert_eq!(comment.parent_guid, Guid::new("post-1")),
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_not_parseable() {
        let wire = WireMessage { kind: "poke".to_string(), body: Value::Null };
        let mut raw = Vec::new();
        ciborium::ser::into_writer(&wire, &mut raw).unwrap();

        let err = Message::decode(&raw).unwrap_err();
        match err {
            ProtocolError::NotParseable(reason) => assert!(reason.contains("poke")),
            other => panic!("expected NotParseable, got {other:?}"),
        }
    }

    #[test]
    fn known_tag_with_mismatched_body_is_not_parseable() {
        // "retraction" tag carrying a post body
        let body = Value::serialized(&Post {
            author: Handle::new("alice@pod.example"),
            guid: Guid::new("post-1"),
            visibility: Visibility::Public,
            body: String::new(),
        })
        .unwrap();
        let wire = WireMessage { kind: "retraction".to_string(), body };
        let mut raw = Vec::new();
        ciborium::ser::into_writer(&wire, &mut raw).unwrap();

        assert!(matches!(Message::decode(&raw), Err(ProtocolError::NotParseable(_))));
    }

    #[test]
    fn garbage_is_not_parseable() {
        assert!(matches!(Message::decode(b"\xffgarbage"), Err(ProtocolError::NotParseable(_))));
    }

    #[test]
    fn object_kind_tag_table_is_closed() {
        for kind in [ObjectKind::Post, ObjectKind::Comment, ObjectKind::Photo, ObjectKind::Person] {
            assert_eq!(ObjectKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(ObjectKind::from_tag("reshare").is_err());
    }

    #[test]
    fn only_comments_are_relayable_and_only_photos_are_media() {
        assert!(ObjectKind::Comment.is_relayable());
        assert!(!ObjectKind::Post.is_relayable());
        assert!(ObjectKind::Photo.is_media());
        assert!(!ObjectKind::Person.is_media());
    }
}
