use nostr_sdk::prelude::*;

use super::parser::Command;
use crate::clock::Clock;
use crate::constants::{ADD_USAGE, HELP_TEXT, NO_TODOS, NO_TODOS_FOUND};
use crate::models::TodoItem;
use crate::nostr::encode_public_id;
use crate::store::{StoreError, TodoStore};

/// Reply text plus any tags the command wants attached to the reply event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub tags: Vec<Tag>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tags: Vec::new(),
        }
    }
}

/// Runs one parsed command on behalf of an authenticated author.
pub struct Executor<'a> {
    store: &'a dyn TodoStore,
    clock: &'a dyn Clock,
    web_base_url: &'a str,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a dyn TodoStore, clock: &'a dyn Clock, web_base_url: &'a str) -> Self {
        Self {
            store,
            clock,
            web_base_url,
        }
    }

    pub fn execute(&self, author: &PublicKey, command: &Command) -> Result<Reply, StoreError> {
        let owner = author.to_hex();
        let reply = match command {
            Command::List => Reply::text(self.list(&owner)?),
            Command::Add(content) => Reply::text(self.add(&owner, content)?),
            Command::AddUsage => Reply::text(ADD_USAGE),
            Command::Delete(seq) => Reply::text(self.delete(&owner, *seq)?),
            Command::Done(seq) => Reply::text(self.done(&owner, *seq)?),
            Command::Search(keyword) => Reply::text(self.search(&owner, keyword)?),
            Command::Show(seq) => Reply::text(self.show(&owner, *seq)?),
            Command::Web => self.web(author),
            Command::Help => Reply::text(HELP_TEXT),
        };
        tracing::info!(owner = %owner, command = ?command, "executed command");
        Ok(reply)
    }

    fn list(&self, owner: &str) -> Result<String, StoreError> {
        let items = self.store.list_incomplete(owner)?;
        Ok(render_previews(&items).unwrap_or_else(|| NO_TODOS.to_string()))
    }

    fn add(&self, owner: &str, content: &str) -> Result<String, StoreError> {
        let seq = self.store.add(owner, content, self.clock.now())?;
        Ok(format!("Added: {seq}"))
    }

    fn delete(&self, owner: &str, seq: u32) -> Result<String, StoreError> {
        Ok(match self.store.delete_by(owner, seq)? {
            0 => not_found(seq),
            _ => format!("Deleted: {seq}"),
        })
    }

    fn done(&self, owner: &str, seq: u32) -> Result<String, StoreError> {
        Ok(match self.store.complete_by(owner, seq)? {
            0 => not_found(seq),
            _ => format!("Done: {seq}"),
        })
    }

    fn search(&self, owner: &str, keyword: &str) -> Result<String, StoreError> {
        let items = self.store.search_incomplete(owner, keyword)?;
        Ok(render_previews(&items).unwrap_or_else(|| NO_TODOS_FOUND.to_string()))
    }

    fn show(&self, owner: &str, seq: u32) -> Result<String, StoreError> {
        Ok(match self.store.get_by_id_any(owner, seq)? {
            Some(item) => item.full_line(),
            None => not_found(seq),
        })
    }

    fn web(&self, author: &PublicKey) -> Reply {
        let url = web_url(self.web_base_url, author);
        Reply {
            tags: vec![Tag::custom(
                TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::R)),
                vec![url.clone()],
            )],
            content: url,
        }
    }
}

pub fn web_url(base_url: &str, author: &PublicKey) -> String {
    format!("{}{}", base_url, encode_public_id(author))
}

fn not_found(seq: u32) -> String {
    format!("Not found: {seq}")
}

fn render_previews(items: &[TodoItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(TodoItem::preview_line)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::constants::DEFAULT_WEB_BASE_URL;
    use crate::store::SqliteTodoStore;

    struct Fixture {
        store: SqliteTodoStore,
        clock: FixedClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: SqliteTodoStore::in_memory().unwrap(),
                clock: FixedClock::new(1_000),
            }
        }

        fn run(&self, author: &PublicKey, command: Command) -> String {
            self.clock.advance(1);
            Executor::new(&self.store, &self.clock, DEFAULT_WEB_BASE_URL)
                .execute(author, &command)
                .unwrap()
                .content
        }
    }

    #[test]
    fn test_add_done_show_flow() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();

        assert_eq!(fx.run(&alice, Command::Add("Buy milk".into())), "Added: 1");
        assert_eq!(fx.run(&alice, Command::Done(1)), "Done: 1");
        assert_eq!(fx.run(&alice, Command::Done(1)), "Not found: 1");
        assert_eq!(fx.run(&alice, Command::List), "No todos");
        assert_eq!(fx.run(&alice, Command::Show(1)), "1. Buy milk");
    }

    #[test]
    fn test_add_records_clock_time() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        fx.run(&alice, Command::Add("task".into()));

        let item = fx.store.get_by_id_any(&alice.to_hex(), 1).unwrap().unwrap();
        assert_eq!(item.created_at, 1_001);
        assert!(!item.completed);
    }

    #[test]
    fn test_usage_does_not_insert() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        assert_eq!(fx.run(&alice, Command::AddUsage), ADD_USAGE);
        assert!(fx.store.list_all(&alice.to_hex()).unwrap().is_empty());
    }

    #[test]
    fn test_list_renders_previews_in_creation_order() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        fx.run(&alice, Command::Add("first".into()));
        fx.run(&alice, Command::Add("a fairly long todo entry\nwith lines".into()));
        fx.run(&alice, Command::Add("third".into()));
        fx.run(&alice, Command::Done(3));

        assert_eq!(
            fx.run(&alice, Command::List),
            "1. first\n2. a fairly long todo e..."
        );
    }

    #[test]
    fn test_search() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        fx.run(&alice, Command::Add("Buy milk".into()));
        fx.run(&alice, Command::Add("buy bread".into()));

        assert_eq!(fx.run(&alice, Command::Search("milk".into())), "1. Buy milk");
        assert_eq!(fx.run(&alice, Command::Search("Bread".into())), NO_TODOS_FOUND);
    }

    #[test]
    fn test_delete_other_owner_reports_not_found() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        let mallory = Keys::generate().public_key();
        fx.run(&alice, Command::Add("secret".into()));

        assert_eq!(fx.run(&mallory, Command::Delete(1)), "Not found: 1");
        assert_eq!(fx.run(&mallory, Command::Done(1)), "Not found: 1");
        assert_eq!(fx.run(&mallory, Command::Show(1)), "Not found: 1");
        assert_eq!(fx.run(&alice, Command::Show(1)), "1. secret");
        assert_eq!(fx.run(&alice, Command::Delete(1)), "Deleted: 1");
        assert_eq!(fx.run(&alice, Command::Show(1)), "Not found: 1");
    }

    #[test]
    fn test_show_keeps_full_content() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        let content = "a very long line that definitely exceeds twenty characters\nand more";
        fx.run(&alice, Command::Add(content.into()));
        assert_eq!(fx.run(&alice, Command::Show(1)), format!("1. {content}"));
    }

    #[test]
    fn test_web_link_and_tag() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        let reply = Executor::new(&fx.store, &fx.clock, "https://example.com/u/")
            .execute(&alice, &Command::Web)
            .unwrap();

        let expected = format!("https://example.com/u/{}", encode_public_id(&alice));
        assert_eq!(reply.content, expected);
        assert_eq!(reply.tags.len(), 1);
        assert_eq!(reply.tags[0].as_slice(), &["r".to_string(), expected]);
    }

    #[test]
    fn test_help() {
        let fx = Fixture::new();
        let alice = Keys::generate().public_key();
        assert_eq!(fx.run(&alice, Command::Help), HELP_TEXT);
    }
}
