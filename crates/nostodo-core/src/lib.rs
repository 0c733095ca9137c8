pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod nostr;
pub mod profile;
pub mod store;
pub mod tracing_setup;

// Re-export the pipeline entry points at crate root for convenience
pub use config::BotConfig;
pub use dispatch::Dispatcher;
pub use error::BotError;
pub use nostr::SigningIdentity;
pub use store::{SqliteTodoStore, StoreError, TodoStore};
