//! Application-wide constants
//!
//! Centralized location for reply texts, defaults and event kinds
//! that are used across multiple modules.

/// Default relays the bot listens on when none are configured
pub const DEFAULT_RELAYS: &[&str] = &["wss://relay.damus.io", "wss://nos.lol"];

/// Base URL of the web view; the author's npub is appended
pub const DEFAULT_WEB_BASE_URL: &str = "https://nostodo.app/todos/";

/// Default bind address for the HTTP view endpoint
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8787";

/// Default SQLite file name inside the data directory
pub const DATABASE_FILE: &str = "nostodo.db";

// Alias entry defaults
pub const DEFAULT_ALIAS_NAME: &str = "todo";
pub const DEFAULT_ALIAS_SUFFIX: &str = "さん";
pub const DEFAULT_ALIAS_ACKNOWLEDGEMENT: &str = "はい！";

/// Profile lookups are cached for one hour
pub const PROFILE_CACHE_TTL_SECS: u64 = 60 * 60;

/// Maximum characters shown per item in list and search replies
pub const PREVIEW_MAX_CHARS: usize = 20;
pub const PREVIEW_ELLIPSIS: &str = "...";

// Reply texts
pub const INVALID_SIGNATURE: &str = "Invalid signature";
pub const NO_TODOS: &str = "No todos";
pub const NO_TODOS_FOUND: &str = "No todos found";
pub const ADD_USAGE: &str = "Usage: add <text>";

pub const HELP_TEXT: &str = "Commands:
list - show your open todos
add <text> - add a todo
done <id> - mark a todo as done
delete <id> - delete a todo
search <keyword> - search your open todos
show <id> - show a todo in full
web - link to your todo list on the web";

// Nostr event kinds handled by the bot
pub mod kinds {
    /// Text note (direct mention)
    pub const TEXT_NOTE: u16 = 1;
    /// Public chat channel message (NIP-28)
    pub const CHANNEL_MESSAGE: u16 = 42;
}
