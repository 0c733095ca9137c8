use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;

use nostodo_core::profile::ProfileFetcher;

/// Fetches the newest kind-0 metadata for a pubkey from the connected relays
pub struct RelayProfileFetcher {
    client: Client,
    timeout: Duration,
}

impl RelayProfileFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ProfileFetcher for RelayProfileFetcher {
    async fn fetch(&self, public_key: &PublicKey) -> anyhow::Result<Option<Metadata>> {
        let filter = Filter::new().kind(Kind::Metadata).author(*public_key).limit(1);
        let events = self.client.fetch_events(filter, self.timeout).await?;

        let newest = events.into_iter().max_by_key(|e| e.created_at);
        match newest {
            Some(event) => Ok(Some(Metadata::from_json(&event.content)?)),
            None => Ok(None),
        }
    }
}
