//! Remote sync listener.
//!
//! Subscribes once to the collection and, for every snapshot pushed by the
//! store, rebuilds the [`LocalListStore`] from scratch. There is no diffing
//! and no retry: when the subscription fails the user is told and the list
//! keeps whatever it last showed.

use futures::StreamExt;

use crate::notice::{emit, Notice, NoticeSink};
use crate::remote::{RemoteError, RemoteStore, Subscription};
use crate::snapshot::Snapshot;
use crate::store::LocalListStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unsubscribed,
    Subscribed,
    /// The subscription failed or ended. Terminal.
    Cancelled,
}

/// What applying one subscription event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// The local list now holds `count` items.
    Replaced { count: usize },
    /// The subscription is gone; the local list was left as is.
    Cancelled,
}

/// An event pulled from the subscription. `None` means the stream ended.
pub type SubscriptionEvent = Option<Result<Snapshot, RemoteError>>;

pub struct SyncListener {
    state: ListenerState,
    subscription: Option<Subscription>,
}

impl SyncListener {
    pub fn new() -> Self {
        Self {
            state: ListenerState::Unsubscribed,
            subscription: None,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Opens the subscription. Only the first call does anything.
    ///
    /// A failure to subscribe is reported as [`Notice::LoadFailed`] and
    /// leaves the listener cancelled.
    pub async fn subscribe<R: RemoteStore>(
        &mut self,
        remote: &R,
        sink: &mut impl NoticeSink,
    ) -> ListenerState {
        if self.state != ListenerState::Unsubscribed {
            return self.state;
        }

        match remote.subscribe().await {
            Ok(subscription) => {
                tracing::debug!("Subscribed to collection");
                self.subscription = Some(subscription);
                self.state = ListenerState::Subscribed;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Subscription failed");
                self.state = ListenerState::Cancelled;
                emit(sink, Notice::LoadFailed);
            }
        }
        self.state
    }

    /// Waits for the next subscription event.
    ///
    /// Never resolves while there is no open subscription, so it can sit in a
    /// `select!` next to input handling.
    pub async fn next_event(&mut self) -> SubscriptionEvent {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => futures::future::pending().await,
        }
    }

    /// Applies one event to the local list.
    pub fn apply(
        &mut self,
        event: SubscriptionEvent,
        store: &mut LocalListStore,
        sink: &mut impl NoticeSink,
    ) -> ListenerEvent {
        match event {
            Some(Ok(snapshot)) => {
                store.replace_all(snapshot.into_items());
                tracing::debug!(count = store.len(), "Local list replaced");
                ListenerEvent::Replaced { count: store.len() }
            }
            Some(Err(e)) => self.cancel(e, sink),
            None => self.cancel(RemoteError::Closed, sink),
        }
    }

    /// Pulls and applies the next event. Returns `None` once cancelled.
    pub async fn process_next(
        &mut self,
        store: &mut LocalListStore,
        sink: &mut impl NoticeSink,
    ) -> Option<ListenerEvent> {
        if self.state != ListenerState::Subscribed {
            return None;
        }
        let event = self.next_event().await;
        Some(self.apply(event, store, sink))
    }

    fn cancel(&mut self, error: RemoteError, sink: &mut impl NoticeSink) -> ListenerEvent {
        tracing::warn!(error = %error, "Subscription cancelled");
        self.subscription = None;
        self.state = ListenerState::Cancelled;
        emit(sink, Notice::LoadFailed);
        ListenerEvent::Cancelled
    }
}

impl Default for SyncListener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::remote::MemoryStore;

    struct Unreachable;

    impl RemoteStore for Unreachable {
        async fn subscribe(&self) -> Result<Subscription, RemoteError> {
            Err(RemoteError::Connection("refused".to_string()))
        }

        async fn write(&self, _key: &str, _item: &Item) -> Result<(), RemoteError> {
            Err(RemoteError::Connection("refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), RemoteError> {
            Err(RemoteError::Connection("refused".to_string()))
        }
    }

    fn snapshot(items: &[(&str, &str)]) -> Snapshot {
        Snapshot::from_children(
            items
                .iter()
                .map(|(id, name)| (id.to_string(), Item::new(*id, *name))),
        )
    }

    #[test]
    fn test_apply_replaces_regardless_of_prior_contents() {
        let mut listener = SyncListener::new();
        let mut store = LocalListStore::new();
        let mut notices: Vec<Notice> = Vec::new();
        store.replace_all(vec![Item::new("9", "Z"), Item::new("8", "Y")]);

        let event = listener.apply(
            Some(Ok(snapshot(&[("1", "A"), ("3", "C")]))),
            &mut store,
            &mut notices,
        );

        assert_eq!(event, ListenerEvent::Replaced { count: 2 });
        assert_eq!(
            store.items(),
            &[Item::new("1", "A"), Item::new("3", "C")][..]
        );
        assert!(notices.is_empty());
    }

    #[test]
    fn test_error_keeps_stale_list() {
        let mut listener = SyncListener::new();
        let mut store = LocalListStore::new();
        let mut notices: Vec<Notice> = Vec::new();
        store.replace_all(vec![Item::new("1", "A")]);

        let event = listener.apply(
            Some(Err(RemoteError::Cancelled("permission denied".to_string()))),
            &mut store,
            &mut notices,
        );

        assert_eq!(event, ListenerEvent::Cancelled);
        assert_eq!(listener.state(), ListenerState::Cancelled);
        assert_eq!(store.items(), &[Item::new("1", "A")][..]);
        assert_eq!(notices, vec![Notice::LoadFailed]);
    }

    #[test]
    fn test_stream_end_is_cancellation() {
        let mut listener = SyncListener::new();
        let mut store = LocalListStore::new();
        let mut notices: Vec<Notice> = Vec::new();

        assert_eq!(
            listener.apply(None, &mut store, &mut notices),
            ListenerEvent::Cancelled
        );
        assert_eq!(notices, vec![Notice::LoadFailed]);
    }

    #[tokio::test]
    async fn test_subscribe_failure_reports_and_cancels() {
        let mut listener = SyncListener::new();
        let mut notices: Vec<Notice> = Vec::new();

        let state = listener.subscribe(&Unreachable, &mut notices).await;

        assert_eq!(state, ListenerState::Cancelled);
        assert_eq!(notices, vec![Notice::LoadFailed]);

        let mut store = LocalListStore::new();
        assert!(listener.process_next(&mut store, &mut notices).await.is_none());
    }

    #[tokio::test]
    async fn test_subscribes_only_once() {
        let remote = MemoryStore::new();
        let mut listener = SyncListener::new();
        let mut notices: Vec<Notice> = Vec::new();

        listener.subscribe(&remote, &mut notices).await;
        listener.subscribe(&remote, &mut notices).await;

        assert_eq!(listener.state(), ListenerState::Subscribed);
        assert_eq!(remote.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_follows_remote_changes() {
        let remote = MemoryStore::new();
        let mut listener = SyncListener::new();
        let mut store = LocalListStore::new();
        let mut notices: Vec<Notice> = Vec::new();

        listener.subscribe(&remote, &mut notices).await;
        let initial = listener.process_next(&mut store, &mut notices).await;
        assert_eq!(initial, Some(ListenerEvent::Replaced { count: 0 }));

        remote.write("5", &Item::new("5", "Cup")).await.unwrap();
        listener.process_next(&mut store, &mut notices).await;
        assert_eq!(store.items(), &[Item::new("5", "Cup")][..]);

        remote.delete("5").await.unwrap();
        listener.process_next(&mut store, &mut notices).await;
        assert!(store.is_empty());
        assert_eq!(store.revision(), 3);
    }
}
