pub mod auth;
pub mod compose;
pub mod identity;

pub use auth::{event_hash, verify};
pub use compose::{compose, is_root_tag, reply_tag};
pub use identity::{decode_secret_key, encode_public_id, SigningIdentity};
