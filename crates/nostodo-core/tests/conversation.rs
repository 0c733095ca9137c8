use std::sync::Arc;

use nostodo_core::clock::FixedClock;
use nostodo_core::constants::{kinds, HELP_TEXT, NO_TODOS};
use nostodo_core::nostr::{is_root_tag, verify};
use nostodo_core::{BotConfig, Dispatcher, SigningIdentity, SqliteTodoStore, TodoStore};
use nostr_sdk::prelude::*;

struct Bot {
    dispatcher: Dispatcher,
    store: Arc<SqliteTodoStore>,
}

impl Bot {
    fn new(store: SqliteTodoStore) -> Self {
        let store = Arc::new(store);
        let dispatcher = Dispatcher::new(
            SigningIdentity::generate(),
            store.clone(),
            Arc::new(FixedClock::new(1_700_000_000)),
            &BotConfig::default(),
        )
        .expect("Failed to build dispatcher");
        Self { dispatcher, store }
    }

    /// Send `content` as a note mentioning the bot and return the reply text
    fn say(&self, keys: &Keys, content: &str) -> String {
        let bot = self.dispatcher.identity();
        let event = EventBuilder::new(
            Kind::TextNote,
            format!("nostr:{} {}", bot.npub(), content),
        )
        .tag(Tag::public_key(bot.public_key()))
        .sign_with_keys(keys)
        .expect("Failed to sign event");

        let entry = self.dispatcher.entry_for(&event).expect("mention not routed");
        let reply = self
            .dispatcher
            .handle(&event, entry)
            .expect("dispatch failed")
            .expect("no reply");
        assert!(verify(&reply));
        reply.content
    }
}

#[test]
fn test_buy_milk_conversation() {
    let bot = Bot::new(SqliteTodoStore::in_memory().unwrap());
    let alice = Keys::generate();

    assert_eq!(bot.say(&alice, "add Buy milk"), "Added: 1");
    assert_eq!(bot.say(&alice, "done 1"), "Done: 1");
    assert_eq!(bot.say(&alice, "done 1"), "Not found: 1");
    assert_eq!(bot.say(&alice, "list"), NO_TODOS);
    assert_eq!(bot.say(&alice, "show 1"), "1. Buy milk");
}

#[test]
fn test_sequence_numbers_increase_across_deletes() {
    let bot = Bot::new(SqliteTodoStore::in_memory().unwrap());
    let alice = Keys::generate();

    assert_eq!(bot.say(&alice, "add one"), "Added: 1");
    assert_eq!(bot.say(&alice, "add two"), "Added: 2");
    assert_eq!(bot.say(&alice, "add three"), "Added: 3");
    assert_eq!(bot.say(&alice, "delete 2"), "Deleted: 2");
    assert_eq!(bot.say(&alice, "delete 3"), "Deleted: 3");
    assert_eq!(bot.say(&alice, "add four"), "Added: 4");
    assert_eq!(bot.say(&alice, "list"), "1. one\n4. four");
}

#[test]
fn test_owners_are_isolated() {
    let bot = Bot::new(SqliteTodoStore::in_memory().unwrap());
    let alice = Keys::generate();
    let bob = Keys::generate();

    bot.say(&alice, "add alice's secret");
    assert_eq!(bot.say(&bob, "list"), NO_TODOS);
    assert_eq!(bot.say(&bob, "delete 1"), "Not found: 1");
    assert_eq!(bot.say(&bob, "done 1"), "Not found: 1");
    assert_eq!(bot.say(&bob, "add bob's"), "Added: 1");
    assert_eq!(bot.say(&alice, "show 1"), "1. alice's secret");
}

#[test]
fn test_help_fallthrough_and_usage() {
    let bot = Bot::new(SqliteTodoStore::in_memory().unwrap());
    let alice = Keys::generate();

    assert_eq!(bot.say(&alice, ""), HELP_TEXT);
    assert_eq!(bot.say(&alice, "what can you do?"), HELP_TEXT);
    assert_eq!(bot.say(&alice, "add   "), "Usage: add <text>");
    assert!(bot
        .store
        .list_all(&alice.public_key().to_hex())
        .unwrap()
        .is_empty());
}

#[test]
fn test_channel_alias_reply_stays_in_channel() {
    let bot = Bot::new(SqliteTodoStore::in_memory().unwrap());
    let alice = Keys::generate();
    let channel_id = "f".repeat(64);
    let root = Tag::parse(["e", channel_id.as_str(), "wss://relay.example", "root"]).unwrap();

    let event = EventBuilder::new(Kind::from(kinds::CHANNEL_MESSAGE), "todoさん add 会議の準備")
        .tag(root.clone())
        .sign_with_keys(&alice)
        .unwrap();

    let entry = bot.dispatcher.entry_for(&event).unwrap();
    let reply = bot.dispatcher.handle(&event, entry).unwrap().unwrap();

    assert_eq!(reply.content, "Added: 1");
    assert_eq!(reply.kind, event.kind);
    let roots: Vec<Tag> = reply.tags.iter().filter(|t| is_root_tag(t)).cloned().collect();
    assert_eq!(roots, vec![root]);
}

#[test]
fn test_state_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nostodo.db");
    let alice = Keys::generate();

    {
        let bot = Bot::new(SqliteTodoStore::new(&path).unwrap());
        assert_eq!(bot.say(&alice, "add first\nwith a second line"), "Added: 1");
    }

    let bot = Bot::new(SqliteTodoStore::new(&path).unwrap());
    assert_eq!(bot.say(&alice, "show 1"), "1. first\nwith a second line");
    assert_eq!(bot.say(&alice, "add second"), "Added: 2");
}
