use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use nostr_sdk::prelude::*;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use nostodo_core::models::TodoItem;
use nostodo_core::nostr::encode_public_id;
use nostodo_core::profile::{Profile, ProfileCache, ProfileFetcher};
use nostodo_core::TodoStore;

/// Shared server state
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn TodoStore>,
    pub profiles: Arc<ProfileCache<Arc<dyn ProfileFetcher>>>,
}

/// Everything the web view needs to render one user's list
#[derive(Debug, Serialize)]
pub struct TodoListView {
    pub npub: String,
    pub profile: Profile,
    pub todos: Vec<TodoItem>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todos/:npub", get(todos))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the view endpoint until the listener fails
pub async fn run_server(bind_addr: String, state: HttpState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("HTTP view listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Handler for GET /todos/:npub
async fn todos(
    Path(npub): Path<String>,
    State(state): State<HttpState>,
) -> Result<Json<TodoListView>, (StatusCode, String)> {
    let public_key = PublicKey::parse(&npub)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid public key: {e}")))?;

    let store = state.store.clone();
    let owner = public_key.to_hex();
    let todos = tokio::task::spawn_blocking(move || store.list_all(&owner))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "failed to list todos");
            (StatusCode::INTERNAL_SERVER_ERROR, "store unavailable".to_string())
        })?;

    let profile = state.profiles.lookup(&public_key).await;

    Ok(Json(TodoListView {
        npub: encode_public_id(&public_key),
        profile,
        todos,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use nostodo_core::clock::FixedClock;
    use nostodo_core::SqliteTodoStore;
    use tower::ServiceExt;

    struct NoProfiles;

    #[async_trait]
    impl ProfileFetcher for NoProfiles {
        async fn fetch(&self, _public_key: &PublicKey) -> anyhow::Result<Option<Metadata>> {
            Ok(None)
        }
    }

    fn state() -> (HttpState, Arc<SqliteTodoStore>) {
        let store = Arc::new(SqliteTodoStore::in_memory().unwrap());
        let fetcher: Arc<dyn ProfileFetcher> = Arc::new(NoProfiles);
        let state = HttpState {
            store: store.clone(),
            profiles: Arc::new(ProfileCache::new(fetcher, Arc::new(FixedClock::new(0)))),
        };
        (state, store)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_lists_all_with_completed_last() {
        let (state, store) = state();
        let keys = Keys::generate();
        let owner = keys.public_key().to_hex();
        store.add(&owner, "first", 1).unwrap();
        store.add(&owner, "second", 2).unwrap();
        store.complete_by(&owner, 1).unwrap();

        let npub = encode_public_id(&keys.public_key());
        let (status, body) = get(router(state), &format!("/todos/{npub}")).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["npub"], npub);
        assert_eq!(json["profile"]["displayName"], format!("{}...", &owner[..8]));
        let todos = json["todos"].as_array().unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0]["seq"], 2);
        assert_eq!(todos[1]["seq"], 1);
        assert_eq!(todos[1]["completed"], true);
    }

    #[tokio::test]
    async fn test_rejects_bad_npub() {
        let (state, _) = state();
        let (status, _) = get(router(state), "/todos/not-a-key").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state();
        let (status, body) = get(router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }
}
