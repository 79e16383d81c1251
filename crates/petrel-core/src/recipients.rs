//! Recipient resolution for top-level messages.
//!
//! Who on this pod should receive a verified message. Public messages fan
//! out to everyone sharing with the sender, ignoring any addressee list
//! the message happens to carry; private messages deliver to exactly the
//! carried addressees that resolve to local principals. An empty result
//! is a valid answer; the caller decides whether it matters.

use std::collections::HashSet;

use petrel_proto::{Message, PrincipalId, Visibility};

use crate::directory::PrincipalIndex;

/// Resolver of local recipients for a verified message.
pub struct RecipientResolver;

impl RecipientResolver {
    /// Compute the set of local principals the message concerns.
    ///
    /// Relayable and retraction messages have no recipient set of their
    /// own (they follow the relay-authority and subscriber paths
    /// respectively) and resolve to the empty set here.
    #[must_use]
    pub fn resolve(message: &Message, principals: &impl PrincipalIndex) -> HashSet<PrincipalId> {
        match message {
            Message::Post(post) => match &post.visibility {
                Visibility::Public => {
                    principals.principals_sharing_with(&post.author).into_iter().collect()
                },
                Visibility::Private { recipients } => recipients
                    .iter()
                    .filter_map(|handle| principals.local_principal(handle))
                    .collect(),
            },
            // Profile updates go to everyone who shares with the sender.
            Message::Profile(profile) => {
                principals.principals_sharing_with(&profile.author).into_iter().collect()
            },
            Message::Comment(_) | Message::Retraction(_) => HashSet::new(),
        }
    }
}
