//! Entry points for inbound events.
//!
//! `handle_direct` serves events that mention the bot; `handle_alias` serves
//! channel messages that address the bot by name (`todoさん list`). Both
//! authenticate before anything else and return `Ok(None)` when no reply may
//! be sent (the bot's own events).

use std::sync::Arc;

use nostr_sdk::prelude::*;
use regex::Regex;

use crate::clock::Clock;
use crate::commands::{normalize, parse, Executor, Reply};
use crate::config::{AliasConfig, BotConfig};
use crate::constants::{kinds, HELP_TEXT, INVALID_SIGNATURE};
use crate::error::{BotError, Result};
use crate::nostr::{compose, verify, SigningIdentity};
use crate::store::TodoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// The event p-tags or references the bot
    Direct,
    /// A channel message that may address the bot by name
    Alias,
}

/// Matches `<name><suffix><whitespace><rest>` and yields `rest`.
#[derive(Debug, Clone)]
pub struct AliasMatcher {
    pattern: Regex,
    /// `<name><suffix>` standing alone or followed by whitespace
    address: Regex,
}

impl AliasMatcher {
    pub fn new(config: &AliasConfig) -> Result<Self> {
        let prefix = format!(
            "{}{}",
            regex::escape(&config.name),
            regex::escape(&config.suffix)
        );
        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map_err(|e| BotError::Config(format!("invalid alias pattern: {e}")))
        };
        Ok(Self {
            pattern: compile(format!(r"(?is)^{prefix}\s+(.+)$"))?,
            address: compile(format!(r"(?i)^{prefix}(?:\s|$)"))?,
        })
    }

    /// Whether the text is addressed to the bot by name
    pub fn addresses(&self, text: &str) -> bool {
        self.address.is_match(text)
    }

    pub fn strip<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

pub struct Dispatcher {
    identity: SigningIdentity,
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock>,
    web_base_url: String,
    alias: AliasMatcher,
    acknowledgement: String,
}

impl Dispatcher {
    pub fn new(
        identity: SigningIdentity,
        store: Arc<dyn TodoStore>,
        clock: Arc<dyn Clock>,
        config: &BotConfig,
    ) -> Result<Self> {
        Ok(Self {
            identity,
            store,
            clock,
            web_base_url: config.web_base_url.clone(),
            alias: AliasMatcher::new(&config.alias)?,
            acknowledgement: config.alias.acknowledgement.clone(),
        })
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Which entry point an inbound event belongs to, if any
    pub fn entry_for(&self, event: &Event) -> Option<Entry> {
        if self.mentions_bot(event) {
            return Some(Entry::Direct);
        }
        if event.kind == Kind::from(kinds::CHANNEL_MESSAGE)
            && self.alias.addresses(&normalize(&event.content))
        {
            return Some(Entry::Alias);
        }
        None
    }

    pub fn handle(&self, event: &Event, entry: Entry) -> Result<Option<Event>> {
        match entry {
            Entry::Direct => self.handle_direct(event),
            Entry::Alias => self.handle_alias(event),
        }
    }

    pub fn handle_direct(&self, event: &Event) -> Result<Option<Event>> {
        if !self.accept(event) {
            return self.reject_or_skip(event);
        }
        let text = normalize(&event.content);
        self.run(event, &text)
    }

    pub fn handle_alias(&self, event: &Event) -> Result<Option<Event>> {
        if !self.accept(event) {
            return self.reject_or_skip(event);
        }
        let text = normalize(&event.content);
        match self.alias.strip(&text) {
            Some(rest) => self.run(event, rest),
            None => {
                let content = format!("{}\n{}", self.acknowledgement, HELP_TEXT);
                self.reply(event, Reply::text(content))
            }
        }
    }

    /// Own events are never processed; forged events get an invalid-signature reply
    fn accept(&self, event: &Event) -> bool {
        event.pubkey != self.identity.public_key() && verify(event)
    }

    fn reject_or_skip(&self, event: &Event) -> Result<Option<Event>> {
        if event.pubkey == self.identity.public_key() {
            tracing::debug!(id = %event.id, "ignoring own event");
            return Ok(None);
        }
        tracing::warn!(id = %event.id, author = %event.pubkey, "rejecting event with invalid signature");
        self.reply(event, Reply::text(INVALID_SIGNATURE))
    }

    fn run(&self, event: &Event, text: &str) -> Result<Option<Event>> {
        let command = parse(text);
        let executor = Executor::new(self.store.as_ref(), self.clock.as_ref(), &self.web_base_url);
        let reply = executor.execute(&event.pubkey, &command)?;
        self.reply(event, reply)
    }

    fn reply(&self, event: &Event, reply: Reply) -> Result<Option<Event>> {
        match compose(&self.identity, event, &reply.content, reply.tags, true) {
            Ok(reply) => Ok(Some(reply)),
            Err(BotError::SelfReply(id)) => {
                tracing::debug!(id = %id, "not replying to own event");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn mentions_bot(&self, event: &Event) -> bool {
        let bot_hex = self.identity.public_key().to_hex();
        let tagged = event.tags.iter().any(|tag| {
            let parts = tag.as_slice();
            parts.first().map(String::as_str) == Some("p")
                && parts.get(1).map(String::as_str) == Some(bot_hex.as_str())
        });
        tagged || event.content.contains(&self.identity.npub())
    }
}
