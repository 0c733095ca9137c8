use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DATABASE_FILE, DEFAULT_ALIAS_ACKNOWLEDGEMENT, DEFAULT_ALIAS_NAME, DEFAULT_ALIAS_SUFFIX,
    DEFAULT_HTTP_BIND, DEFAULT_RELAYS, DEFAULT_WEB_BASE_URL,
};
use crate::error::{BotError, Result};
use crate::nostr::SigningIdentity;

/// Bot configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Credentials for the bot's own identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    pub relays: Vec<String>,

    /// Channel ids (kind 40 event ids) watched for alias mentions
    pub channels: Vec<String>,

    /// SQLite file; defaults to `<data dir>/nostodo.db`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    pub web_base_url: String,

    pub http_bind: String,

    pub alias: AliasConfig,
}

/// Nostr credentials configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// nsec, hex, or ncryptsec (encrypted) key
    pub key: String,

    /// Password for ncryptsec decryption (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// How the bot is addressed by name in a channel, e.g. `todoさん list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AliasConfig {
    pub name: String,
    pub suffix: String,
    /// Sent ahead of the help text when the bot is addressed with nothing after it
    pub acknowledgement: String,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ALIAS_NAME.to_string(),
            suffix: DEFAULT_ALIAS_SUFFIX.to_string(),
            acknowledgement: DEFAULT_ALIAS_ACKNOWLEDGEMENT.to_string(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            channels: Vec::new(),
            database_path: None,
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            alias: AliasConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BotError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_json(&content).map_err(|e| {
            BotError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BotError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BotError::Config(e.to_string()))
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nostodo")
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE))
    }

    pub fn identity(&self) -> Result<SigningIdentity> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| BotError::Config("no credentials configured".to_string()))?;
        SigningIdentity::from_secret(&creds.key, creds.password.as_deref())
    }
}
