//! Command grammar.
//!
//! Patterns are tried in order and the first match wins. Each pattern must
//! cover the whole normalized message; anything unmatched is `Help`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `list` - open items
    List,
    /// `add <text>`
    Add(String),
    /// `add` with nothing after it
    AddUsage,
    /// `delete <id>`
    Delete(u32),
    /// `done <id>`
    Done(u32),
    /// `search <keyword>`
    Search(String),
    /// `show <id>`
    Show(u32),
    /// `web` - link to the web view
    Web,
    Help,
}

struct Grammar {
    list: Regex,
    add: Regex,
    delete: Regex,
    done: Regex,
    search: Regex,
    show: Regex,
    web: Regex,
}

fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid command regex");
        Grammar {
            list: re(r"(?i)^list$"),
            add: re(r"(?is)^add(?:\s+(.*))?$"),
            delete: re(r"(?i)^delete\s+([0-9]+)$"),
            done: re(r"(?i)^done\s+([0-9]+)$"),
            search: re(r"(?is)^search\s+(.+)$"),
            show: re(r"(?i)^show\s+([0-9]+)$"),
            web: re(r"(?i)^web$"),
        }
    })
}

fn capture_id(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

pub fn parse(text: &str) -> Command {
    let g = grammar();

    if g.list.is_match(text) {
        return Command::List;
    }
    if let Some(caps) = g.add.captures(text) {
        let body = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        return if body.is_empty() {
            Command::AddUsage
        } else {
            Command::Add(body.to_string())
        };
    }
    if let Some(id) = capture_id(&g.delete, text) {
        return Command::Delete(id);
    }
    if let Some(id) = capture_id(&g.done, text) {
        return Command::Done(id);
    }
    if let Some(caps) = g.search.captures(text) {
        let keyword = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !keyword.is_empty() {
            return Command::Search(keyword.to_string());
        }
    }
    if let Some(id) = capture_id(&g.show, text) {
        return Command::Show(id);
    }
    if g.web.is_match(text) {
        return Command::Web;
    }
    Command::Help
}
