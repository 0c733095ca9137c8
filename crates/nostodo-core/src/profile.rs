//! Best-effort profile lookup with an expiring in-process cache.
//!
//! Lookups never fail: any fetch error, timeout, or missing metadata yields
//! the fallback profile (truncated pubkey, no avatar).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::Clock;
use crate::constants::PROFILE_CACHE_TTL_SECS;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub avatar_url: String,
}

impl Profile {
    pub fn fallback(public_key: &PublicKey) -> Self {
        let hex = public_key.to_hex();
        Self {
            display_name: format!("{}...", &hex[..8.min(hex.len())]),
            avatar_url: String::new(),
        }
    }

    /// Prefers `display_name`, then `name`
    pub fn from_metadata(public_key: &PublicKey, metadata: &Metadata) -> Self {
        let display_name = [&metadata.display_name, &metadata.name]
            .into_iter()
            .flatten()
            .find(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| Self::fallback(public_key).display_name);
        Self {
            display_name,
            avatar_url: metadata.picture.clone().unwrap_or_default(),
        }
    }
}

/// Source of kind-0 metadata, usually a set of relays
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, public_key: &PublicKey) -> anyhow::Result<Option<Metadata>>;
}

#[async_trait]
impl<T: ProfileFetcher + ?Sized> ProfileFetcher for Arc<T> {
    async fn fetch(&self, public_key: &PublicKey) -> anyhow::Result<Option<Metadata>> {
        (**self).fetch(public_key).await
    }
}

struct CachedProfile {
    profile: Profile,
    expires_at: u64,
}

pub struct ProfileCache<F> {
    fetcher: F,
    clock: Arc<dyn Clock>,
    ttl_secs: u64,
    fetch_timeout: Duration,
    entries: Mutex<HashMap<PublicKey, CachedProfile>>,
}

impl<F: ProfileFetcher> ProfileCache<F> {
    pub fn new(fetcher: F, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            clock,
            ttl_secs: PROFILE_CACHE_TTL_SECS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub async fn lookup(&self, public_key: &PublicKey) -> Profile {
        let now = self.clock.now();
        if let Some(hit) = self.cached(public_key, now) {
            return hit;
        }

        let fetched = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(public_key)).await;
        let profile = match fetched {
            Ok(Ok(Some(metadata))) => Profile::from_metadata(public_key, &metadata),
            Ok(Ok(None)) => Profile::fallback(public_key),
            Ok(Err(e)) => {
                tracing::debug!(pubkey = %public_key, error = %e, "profile fetch failed");
                return Profile::fallback(public_key);
            }
            Err(_) => {
                tracing::debug!(pubkey = %public_key, "profile fetch timed out");
                return Profile::fallback(public_key);
            }
        };

        self.entries.lock().insert(
            *public_key,
            CachedProfile {
                profile: profile.clone(),
                expires_at: now + self.ttl_secs,
            },
        );
        profile
    }

    fn cached(&self, public_key: &PublicKey, now: u64) -> Option<Profile> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(public_key) {
            Some(entry) if entry.expires_at > now => return Some(entry.profile.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(public_key);
        }
        None
    }
}
