use serde::{Deserialize, Serialize};

use crate::constants::{PREVIEW_ELLIPSIS, PREVIEW_MAX_CHARS};

/// A single TODO entry owned by one pubkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Hex pubkey of the owner
    pub owner: String,
    /// 1-based, per-owner sequence number shown to users
    pub seq: u32,
    pub content: String,
    pub completed: bool,
    pub created_at: u64,
}

impl TodoItem {
    pub fn new(owner: impl Into<String>, seq: u32, content: impl Into<String>, created_at: u64) -> Self {
        Self {
            owner: owner.into(),
            seq,
            content: content.into(),
            completed: false,
            created_at,
        }
    }

    /// One-line form used by list and search replies: `"<seq>. <preview>"`
    pub fn preview_line(&self) -> String {
        format!("{}. {}", self.seq, preview(&self.content))
    }

    /// Full form used by show replies: `"<seq>. <content>"`
    pub fn full_line(&self) -> String {
        format!("{}. {}", self.seq, self.content)
    }
}

/// Collapse whitespace runs to single spaces and cut to `PREVIEW_MAX_CHARS` characters.
/// The ellipsis is appended only when something was cut.
pub fn preview(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_MAX_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(PREVIEW_MAX_CHARS).collect();
    truncated.push_str(PREVIEW_ELLIPSIS);
    truncated
}
