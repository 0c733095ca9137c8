use nostr_sdk::nips::nip49::EncryptedSecretKey;
use nostr_sdk::prelude::*;

use crate::error::{BotError, Result};

/// The bot's own key pair. Everyone else is known only by their `PublicKey`.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    keys: Keys,
}

impl SigningIdentity {
    pub fn new(keys: Keys) -> Self {
        Self { keys }
    }

    pub fn generate() -> Self {
        Self::new(Keys::generate())
    }

    /// Accepts an nsec, a hex secret key, or an ncryptsec together with its password
    pub fn from_secret(encoded: &str, password: Option<&str>) -> Result<Self> {
        let secret_key = decode_secret_key(encoded, password)?;
        Ok(Self::new(Keys::new(secret_key)))
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    pub fn npub(&self) -> String {
        encode_public_id(&self.public_key())
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Hash and sign a prepared event
    pub fn sign(&self, builder: EventBuilder) -> Result<Event> {
        builder
            .sign_with_keys(&self.keys)
            .map_err(|e| BotError::Signing(e.to_string()))
    }
}

pub fn decode_secret_key(encoded: &str, password: Option<&str>) -> Result<SecretKey> {
    let encoded = encoded.trim();
    if encoded.starts_with("ncryptsec") {
        let password = password.ok_or_else(|| {
            BotError::InvalidKey("password required for ncryptsec but not provided".to_string())
        })?;
        let encrypted = EncryptedSecretKey::from_bech32(encoded)
            .map_err(|e| BotError::InvalidKey(e.to_string()))?;
        return encrypted
            .decrypt(password)
            .map_err(|e| BotError::InvalidKey(e.to_string()));
    }
    SecretKey::parse(encoded).map_err(|e| BotError::InvalidKey(e.to_string()))
}

/// Canonical display form of a public key (`npub1...`)
pub fn encode_public_id(public_key: &PublicKey) -> String {
    public_key
        .to_bech32()
        .unwrap_or_else(|_| public_key.to_hex())
}
