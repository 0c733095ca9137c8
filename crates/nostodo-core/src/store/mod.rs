//! Owner-scoped TODO persistence.
//!
//! Every operation takes the owner's hex pubkey; nothing here can observe or
//! mutate another owner's items.

pub mod db;

pub use db::SqliteTodoStore;

use crate::models::TodoItem;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not allocate a sequence number for {0}")]
    SequenceConflict(String),
}

pub trait TodoStore: Send + Sync {
    /// Highest sequence number ever assigned to `owner`, plus one
    fn next_sequence_number(&self, owner: &str) -> Result<u32, StoreError>;

    fn insert(&self, item: &TodoItem) -> Result<(), StoreError>;

    /// Allocate the next sequence number and insert in one step. Returns the sequence number.
    fn add(&self, owner: &str, content: &str, created_at: u64) -> Result<u32, StoreError>;

    /// Returns the number of rows removed
    fn delete_by(&self, owner: &str, seq: u32) -> Result<usize, StoreError>;

    /// Marks an incomplete item as completed. Returns the number of rows changed.
    fn complete_by(&self, owner: &str, seq: u32) -> Result<usize, StoreError>;

    /// Incomplete items, oldest first
    fn list_incomplete(&self, owner: &str) -> Result<Vec<TodoItem>, StoreError>;

    /// Incomplete items whose content contains `keyword` (case-sensitive), oldest first
    fn search_incomplete(&self, owner: &str, keyword: &str) -> Result<Vec<TodoItem>, StoreError>;

    /// Lookup regardless of completion state
    fn get_by_id_any(&self, owner: &str, seq: u32) -> Result<Option<TodoItem>, StoreError>;

    /// All items, incomplete first, then oldest first
    fn list_all(&self, owner: &str) -> Result<Vec<TodoItem>, StoreError>;
}
