use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use nostr_sdk::prelude::*;
use tokio::sync::broadcast::error::RecvError;

use nostodo_core::clock::{Clock, SystemClock};
use nostodo_core::constants::kinds;
use nostodo_core::dispatch::Entry;
use nostodo_core::profile::{ProfileCache, ProfileFetcher};
use nostodo_core::{BotConfig, Dispatcher, SqliteTodoStore, TodoStore};

use super::http::{self, HttpState};
use super::profile_fetcher::RelayProfileFetcher;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(5);
const PROFILE_FETCH_TIMEOUT: Duration = Duration::from_secs(3);
/// How many recent event ids are remembered to drop relay duplicates
const SEEN_CAPACITY: usize = 4096;

/// Bounded memory of event ids already handled, oldest forgotten first
pub struct SeenEvents {
    ids: HashSet<EventId>,
    order: VecDeque<EventId>,
    capacity: usize,
}

impl SeenEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false if the id was already seen
    pub fn insert(&mut self, id: EventId) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }
}

fn subscription_filters(bot: &PublicKey, channels: &[String], since: Timestamp) -> Vec<Filter> {
    let mut filters = vec![Filter::new()
        .kinds([Kind::from(kinds::TEXT_NOTE), Kind::from(kinds::CHANNEL_MESSAGE)])
        .custom_tag(SingleLetterTag::lowercase(Alphabet::P), bot.to_hex())
        .since(since)];

    if !channels.is_empty() {
        let channel_filter = channels.iter().fold(
            Filter::new().kind(Kind::from(kinds::CHANNEL_MESSAGE)).since(since),
            |filter, channel| {
                filter.custom_tag(SingleLetterTag::lowercase(Alphabet::E), channel.clone())
            },
        );
        filters.push(channel_filter);
    }
    filters
}

/// Connect to the configured relays and answer mentions until Ctrl-C
#[tokio::main]
pub async fn run_bot(config: BotConfig, serve_http: bool) -> Result<()> {
    let identity = config.identity().context("Failed to load bot identity")?;
    let bot_pubkey = identity.public_key();
    tracing::info!(npub = %identity.npub(), "starting nostodo bot");

    let db_path = config.database_path();
    let store: Arc<dyn TodoStore> = Arc::new(
        SqliteTodoStore::new(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dispatcher = Arc::new(Dispatcher::new(
        identity.clone(),
        store.clone(),
        clock.clone(),
        &config,
    )?);

    let client = Client::builder().signer(identity.keys().clone()).build();
    for url in &config.relays {
        client
            .add_relay(url)
            .await
            .with_context(|| format!("Invalid relay url {url}"))?;
    }
    if tokio::time::timeout(CONNECT_TIMEOUT, client.connect())
        .await
        .is_err()
    {
        tracing::warn!("relay connect timed out after {:?}, continuing", CONNECT_TIMEOUT);
    }

    for filter in subscription_filters(&bot_pubkey, &config.channels, Timestamp::now()) {
        client
            .subscribe(filter, None)
            .await
            .context("Failed to subscribe")?;
    }
    tracing::info!(
        relays = config.relays.len(),
        channels = config.channels.len(),
        "subscribed to mentions"
    );

    if serve_http {
        let fetcher: Arc<dyn ProfileFetcher> =
            Arc::new(RelayProfileFetcher::new(client.clone(), PROFILE_FETCH_TIMEOUT));
        let state = HttpState {
            store: store.clone(),
            profiles: Arc::new(ProfileCache::new(fetcher, clock.clone())),
        };
        let bind = config.http_bind.clone();
        tokio::spawn(async move {
            if let Err(e) = http::run_server(bind, state).await {
                tracing::error!(error = %e, "HTTP view stopped");
            }
        });
    }

    let mut seen = SeenEvents::new(SEEN_CAPACITY);
    let mut notifications = client.notifications();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            result = notifications.recv() => {
                match result {
                    Ok(RelayPoolNotification::Event { event, relay_url, .. }) => {
                        if !seen.insert(event.id) {
                            continue;
                        }
                        let Some(entry) = dispatcher.entry_for(&event) else {
                            continue;
                        };
                        tracing::debug!(id = %event.id, kind = %event.kind, relay = %relay_url, ?entry, "received event");
                        spawn_handler(dispatcher.clone(), client.clone(), *event, entry);
                    }
                    Ok(RelayPoolNotification::Shutdown) => {
                        tracing::warn!("relay pool shut down");
                        break;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "notification receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    client.disconnect().await;
    tracing::info!("bot stopped");
    Ok(())
}

/// Each event is handled on its own task; the store call runs on the blocking pool.
fn spawn_handler(dispatcher: Arc<Dispatcher>, client: Client, event: Event, entry: Entry) {
    tokio::spawn(async move {
        let event_id = event.id;
        let outcome = tokio::task::spawn_blocking(move || dispatcher.handle(&event, entry)).await;

        let reply = match outcome {
            Ok(Ok(Some(reply))) => reply,
            Ok(Ok(None)) => return,
            Ok(Err(e)) => {
                tracing::error!(id = %event_id, error = %e, "failed to handle event");
                return;
            }
            Err(e) => {
                tracing::error!(id = %event_id, error = %e, "handler task panicked");
                return;
            }
        };

        match tokio::time::timeout(SEND_TIMEOUT, client.send_event(&reply)).await {
            Ok(Ok(_)) => tracing::info!(id = %event_id, reply = %reply.id, "reply published"),
            Ok(Err(e)) => tracing::warn!(id = %event_id, error = %e, "failed to publish reply"),
            Err(_) => tracing::warn!(id = %event_id, "publishing reply timed out"),
        }
    });
}
