//! In-process realtime collection.
//!
//! Holds the children of one collection and broadcasts a full snapshot to
//! every subscriber after each change. The server uses it as the live copy
//! of its collection; tests use it as a stand-in for the network.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use super::{RemoteError, RemoteStore, Subscription};
use crate::models::Item;
use crate::snapshot::Snapshot;

/// Buffered snapshots per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 16;

struct Inner {
    children: RwLock<HashMap<String, Item>>,
    changes: broadcast::Sender<Snapshot>,
}

/// Cloning shares the same collection.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_children(Vec::new())
    }

    /// Creates a store pre-populated with `children`.
    pub fn with_children(children: impl IntoIterator<Item = (String, Item)>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                children: RwLock::new(children.into_iter().collect()),
                changes,
            }),
        }
    }

    /// Current contents.
    pub async fn snapshot(&self) -> Snapshot {
        let children = self.inner.children.read().await;
        Self::build_snapshot(&children)
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    fn build_snapshot(children: &HashMap<String, Item>) -> Snapshot {
        Snapshot::from_children(children.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Sends while the write lock is held so subscribers see changes in order.
    fn publish(&self, children: &HashMap<String, Item>) {
        let snapshot = Self::build_snapshot(children);
        tracing::debug!(
            children = snapshot.len(),
            subscribers = self.subscriber_count(),
            "Publishing snapshot"
        );
        // No subscribers is fine
        let _ = self.inner.changes.send(snapshot);
    }

    /// Stores `item` under `key`. Returns false if nothing changed.
    pub async fn put(&self, key: &str, item: Item) -> bool {
        let mut children = self.inner.children.write().await;
        if children.get(key) == Some(&item) {
            return false;
        }
        children.insert(key.to_string(), item);
        self.publish(&children);
        true
    }

    /// Removes `key`. Returns false if it was not present.
    pub async fn remove(&self, key: &str) -> bool {
        let mut children = self.inner.children.write().await;
        if children.remove(key).is_none() {
            return false;
        }
        self.publish(&children);
        true
    }

    /// Opens a subscription starting with the current contents.
    pub async fn listen(&self) -> Subscription {
        let (current, receiver) = {
            let children = self.inner.children.read().await;
            (
                Self::build_snapshot(&children),
                self.inner.changes.subscribe(),
            )
        };

        let updates = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(snapshot) => return Some((Ok::<_, RemoteError>(snapshot), receiver)),
                    // Every message is a full state, so skipping is harmless
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        stream::once(async move { Ok::<_, RemoteError>(current) })
            .chain(updates)
            .boxed()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryStore {
    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        Ok(self.listen().await)
    }

    async fn write(&self, key: &str, item: &Item) -> Result<(), RemoteError> {
        self.put(key, item.clone()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        self.remove(key).await;
        Ok(())
    }
}
