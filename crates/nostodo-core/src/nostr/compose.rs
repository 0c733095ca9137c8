//! Reply construction.
//!
//! A reply copies the trigger's kind, is timestamped one second after it, and
//! threads back to it with a NIP-10 `reply` marker. Channel messages (kind 42)
//! also carry every `root` e-tag of the trigger so the reply stays in the channel.

use nostr_sdk::prelude::*;

use super::identity::SigningIdentity;
use crate::constants::kinds;
use crate::error::{BotError, Result};

/// `["e", <id>, "", "reply"]`
pub fn reply_tag(event_id: &EventId) -> Tag {
    Tag::custom(
        TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::E)),
        vec![event_id.to_hex(), String::new(), "reply".to_string()],
    )
}

/// An `e` tag carrying the `root` marker
pub fn is_root_tag(tag: &Tag) -> bool {
    let parts = tag.as_slice();
    parts.first().map(String::as_str) == Some("e")
        && parts.get(3).map(String::as_str) == Some("root")
}

pub fn compose(
    identity: &SigningIdentity,
    trigger: &Event,
    reply_text: &str,
    extra_tags: Vec<Tag>,
    notify_sender: bool,
) -> Result<Event> {
    if trigger.pubkey == identity.public_key() {
        return Err(BotError::SelfReply(trigger.id.to_hex()));
    }

    let mut tags = vec![reply_tag(&trigger.id)];
    if notify_sender {
        tags.push(Tag::public_key(trigger.pubkey));
    }
    if trigger.kind == Kind::from(kinds::CHANNEL_MESSAGE) {
        tags.extend(trigger.tags.iter().filter(|t| is_root_tag(t)).cloned());
    }
    tags.extend(extra_tags);

    let created_at = Timestamp::from(trigger.created_at.as_u64().saturating_add(1));
    let builder = EventBuilder::new(trigger.kind, reply_text)
        .tags(tags)
        .custom_created_at(created_at);

    identity.sign(builder)
}
