//! HTTP and WebSocket surface of the realtime store.
//!
//! - `GET /health`: health check
//! - `GET /{collection}`: current snapshot
//! - `PUT /{collection}/{key}`: store an item under `key` (overwrite)
//! - `DELETE /{collection}/{key}`: remove `key`
//! - `GET /{collection}/ws`: WebSocket pushing a full snapshot on connect
//!   and after every change
//!
//! Only the configured collection is served.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use super::storage::ItemTable;
use crate::models::Item;
use crate::remote::{MemoryStore, StreamMessage};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    table: ItemTable,
    live: MemoryStore,
    /// Serializes persist-then-apply so the table and live copy agree
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Loads the persisted collection into a fresh live store.
    pub async fn load(table: ItemTable) -> Result<Self, sqlx::Error> {
        let children = table.load_all().await?;
        tracing::info!(
            collection = table.collection(),
            children = children.len(),
            "Loaded collection"
        );
        Ok(Self {
            table,
            live: MemoryStore::with_children(children),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn live(&self) -> &MemoryStore {
        &self.live
    }

    fn serves(&self, collection: &str) -> bool {
        self.table.collection() == collection
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn not_found(collection: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not_found",
            message: format!("Unknown collection: {}", collection),
        }),
    )
        .into_response()
}

fn storage_failure(e: sqlx::Error) -> Response {
    tracing::error!(error = %e, "Storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "storage_error",
            message: "Failed to persist change".to_string(),
        }),
    )
        .into_response()
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_snapshot(Path(collection): Path<String>, State(state): State<AppState>) -> Response {
    if !state.serves(&collection) {
        return not_found(&collection);
    }
    Json(state.live.snapshot().await).into_response()
}

async fn put_child(
    Path((collection, key)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(item): Json<Item>,
) -> Response {
    if !state.serves(&collection) {
        return not_found(&collection);
    }

    let _guard = state.write_lock.lock().await;
    if let Err(e) = state.table.upsert(&key, &item).await {
        return storage_failure(e);
    }
    let changed = state.live.put(&key, item).await;
    tracing::info!(%key, changed, "Child written");

    StatusCode::NO_CONTENT.into_response()
}

async fn delete_child(
    Path((collection, key)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    if !state.serves(&collection) {
        return not_found(&collection);
    }

    let _guard = state.write_lock.lock().await;
    if let Err(e) = state.table.remove(&key).await {
        return storage_failure(e);
    }
    let changed = state.live.remove(&key).await;
    tracing::info!(%key, changed, "Child removed");

    StatusCode::NO_CONTENT.into_response()
}

async fn subscribe(
    ws: WebSocketUpgrade,
    Path(collection): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if !state.serves(&collection) {
        return not_found(&collection);
    }
    let live = state.live.clone();
    ws.on_upgrade(move |socket| stream_snapshots(socket, live))
}

async fn send(socket: &mut WebSocket, msg: StreamMessage) -> bool {
    match msg.encode() {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode stream message");
            false
        }
    }
}

/// Pushes snapshots to one subscriber until either side goes away.
async fn stream_snapshots(mut socket: WebSocket, live: MemoryStore) {
    let session = uuid::Uuid::new_v4();
    tracing::info!(%session, "Subscriber connected");

    let mut subscription = live.listen().await;

    loop {
        tokio::select! {
            next = subscription.next() => {
                let msg = match next {
                    Some(Ok(snapshot)) => StreamMessage::from(snapshot),
                    Some(Err(e)) => StreamMessage::Cancelled { message: e.to_string() },
                    None => StreamMessage::Cancelled {
                        message: "collection closed".to_string(),
                    },
                };
                let cancelled = matches!(msg, StreamMessage::Cancelled { .. });
                if !send(&mut socket, msg).await || cancelled {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {
                    // Subscribers have nothing to say
                }
            }
        }
    }

    tracing::info!(%session, "Subscriber disconnected");
}

/// Builds the router for `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/{collection}", get(get_snapshot))
        .route("/{collection}/ws", get(subscribe))
        .route("/{collection}/{key}", put(put_child).delete(delete_child))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::storage::open_database;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    async fn state() -> (TempDir, AppState) {
        let temp_dir = tempdir().unwrap();
        let pool = open_database(&temp_dir.path().join("items.db")).await.unwrap();
        let state = AppState::load(ItemTable::new(pool, "items")).await.unwrap();
        (temp_dir, state)
    }

    fn put_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, state) = state().await;
        let (status, body) = get_json(router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_put_then_get_snapshot() {
        let (_dir, state) = state().await;
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(put_request("/items/10", r#"{"id":"10","name":"Pen"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, body) = get_json(app, "/items").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "children": [{"key": "10", "value": {"id": "10", "name": "Pen"}}]
            })
        );
    }

    #[tokio::test]
    async fn test_put_persists_to_table() {
        let (_dir, state) = state().await;
        let app = router(state.clone());

        app.oneshot(put_request("/items/3", r#"{"id":"3","name":"C"}"#))
            .await
            .unwrap();

        let rows = state.table.load_all().await.unwrap();
        assert_eq!(rows, vec![("3".to_string(), Item::new("3", "C"))]);
    }

    #[tokio::test]
    async fn test_put_tolerates_missing_fields() {
        let (_dir, state) = state().await;
        let app = router(state.clone());

        let response = app.oneshot(put_request("/items/4", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            state.live.snapshot().await.get("4"),
            Some(&Item::default())
        );
    }

    #[tokio::test]
    async fn test_delete_child() {
        let (_dir, state) = state().await;
        state.live.put("5", Item::new("5", "Cup")).await;
        state.table.upsert("5", &Item::new("5", "Cup")).await.unwrap();

        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/items/5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.live.snapshot().await.is_empty());
        assert!(state.table.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_found() {
        let (_dir, state) = state().await;
        let app = router(state);

        let (status, body) = get_json(app.clone(), "/other").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let response = app
            .oneshot(put_request("/other/1", r#"{"id":"1","name":"A"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_broadcasts_to_live_subscribers() {
        let (_dir, state) = state().await;
        let mut subscription = state.live().listen().await;
        assert!(subscription.next().await.unwrap().unwrap().is_empty());

        router(state.clone())
            .oneshot(put_request("/items/1", r#"{"id":"1","name":"A"}"#))
            .await
            .unwrap();

        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(snapshot.items(), vec![Item::new("1", "A")]);
    }
}
