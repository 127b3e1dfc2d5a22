//! End-to-end: the HTTP client and listener against a running server.

use std::net::SocketAddr;
use std::time::Duration;

use itemsync::server::{open_database, router, AppState, ItemTable};
use itemsync::{
    HttpRemote, Item, ItemActions, ListenerEvent, LocalListStore, Notice, RemoteStore,
    SyncListener,
};
use tempfile::TempDir;

async fn start_server() -> (TempDir, SocketAddr) {
    let temp_dir = tempfile::tempdir().unwrap();
    let pool = open_database(&temp_dir.path().join("items.db")).await.unwrap();
    let state = AppState::load(ItemTable::new(pool, "items")).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    (temp_dir, addr)
}

/// Applies snapshots until `done` holds for the local list.
async fn wait_for(
    listener: &mut SyncListener,
    store: &mut LocalListStore,
    notices: &mut Vec<Notice>,
    done: impl Fn(&[Item]) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(store.items()) {
            let event = listener.process_next(store, notices).await;
            assert!(matches!(event, Some(ListenerEvent::Replaced { .. })));
        }
    })
    .await
    .expect("timed out waiting for snapshot");
}

#[tokio::test]
async fn test_add_twice_leaves_one_item() {
    let (_dir, addr) = start_server().await;
    let remote = HttpRemote::new(format!("http://{}", addr), "items");

    let mut listener = SyncListener::new();
    let mut store = LocalListStore::new();
    let mut notices: Vec<Notice> = Vec::new();
    listener.subscribe(&remote, &mut notices).await;

    ItemActions::new(&remote, &mut notices)
        .add("10", "Pen")
        .await
        .unwrap();
    wait_for(&mut listener, &mut store, &mut notices, |items| {
        items == [Item::new("10", "Pen")]
    })
    .await;

    ItemActions::new(&remote, &mut notices)
        .add("10", "Pencil")
        .await
        .unwrap();
    wait_for(&mut listener, &mut store, &mut notices, |items| {
        items == [Item::new("10", "Pencil")]
    })
    .await;

    assert_eq!(notices, vec![Notice::ItemAdded, Notice::ItemAdded]);
}

#[tokio::test]
async fn test_update_with_new_id_and_delete() {
    let (_dir, addr) = start_server().await;
    let remote = HttpRemote::new(format!("http://{}", addr), "items");

    let mut listener = SyncListener::new();
    let mut store = LocalListStore::new();
    let mut notices: Vec<Notice> = Vec::new();

    remote.write("1", &Item::new("1", "Old")).await.unwrap();
    remote.write("5", &Item::new("5", "Cup")).await.unwrap();
    listener.subscribe(&remote, &mut notices).await;
    wait_for(&mut listener, &mut store, &mut notices, |items| items.len() == 2).await;

    let original = store.get(0).cloned().unwrap();
    assert_eq!(original, Item::new("1", "Old"));

    let outcome = ItemActions::new(&remote, &mut notices)
        .update(&original, "2", "New")
        .await
        .unwrap();
    assert!(outcome.is_applied());
    wait_for(&mut listener, &mut store, &mut notices, |items| {
        items == [Item::new("2", "New"), Item::new("5", "Cup")]
    })
    .await;

    ItemActions::new(&remote, &mut notices)
        .delete(&Item::new("5", "Cup"))
        .await
        .unwrap();
    wait_for(&mut listener, &mut store, &mut notices, |items| {
        items == [Item::new("2", "New")]
    })
    .await;
}

#[tokio::test]
async fn test_invalid_input_never_reaches_server() {
    let (_dir, addr) = start_server().await;
    let remote = HttpRemote::new(format!("http://{}", addr), "items");
    let mut notices: Vec<Notice> = Vec::new();

    assert!(ItemActions::new(&remote, &mut notices)
        .add("abc", "Pen")
        .await
        .is_err());

    let mut listener = SyncListener::new();
    let mut store = LocalListStore::new();
    listener.subscribe(&remote, &mut notices).await;
    listener.process_next(&mut store, &mut notices).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_collection_subscription_fails() {
    let (_dir, addr) = start_server().await;
    let remote = HttpRemote::new(format!("http://{}", addr), "missing");

    let mut listener = SyncListener::new();
    let mut notices: Vec<Notice> = Vec::new();
    listener.subscribe(&remote, &mut notices).await;

    assert_eq!(notices, vec![Notice::LoadFailed]);
}

#[tokio::test]
async fn test_write_to_unknown_collection_reports_failure() {
    let (_dir, addr) = start_server().await;
    let remote = HttpRemote::new(format!("http://{}", addr), "missing");
    let mut notices: Vec<Notice> = Vec::new();

    let result = ItemActions::new(&remote, &mut notices).add("1", "A").await;

    assert!(result.is_err());
    assert_eq!(notices, vec![Notice::AddFailed]);
}
