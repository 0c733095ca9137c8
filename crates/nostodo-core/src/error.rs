use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The triggering event was authored by the bot itself
    #[error("Refusing to reply to own event {0}")]
    SelfReply(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
