//! The remote realtime key-value store.
//!
//! [`RemoteStore`] is the seam between the item list and whatever holds the
//! collection: [`MemoryStore`] in process, or [`HttpRemote`] talking to the
//! companion server. Writes and deletes are independent keyed operations;
//! changes come back only through the subscription as full snapshots.

pub mod client;
pub mod memory;
pub mod protocol;

use futures::stream::BoxStream;
use std::future::Future;

use crate::models::Item;
use crate::snapshot::Snapshot;

pub use client::HttpRemote;
pub use memory::MemoryStore;
pub use protocol::StreamMessage;

/// Stream of full snapshots. The first element is the current state. The
/// stream ends after yielding an error.
pub type Subscription = BoxStream<'static, Result<Snapshot, RemoteError>>;

/// Errors from the remote store.
///
/// Callers treat every variant the same way (report and continue); the
/// detail only goes to the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Could not reach the store
    Connection(String),
    /// The store answered with a non-success status
    Status(u16),
    /// WebSocket transport error
    WebSocket(String),
    /// Malformed payload
    Decode(String),
    /// The store cancelled the subscription
    Cancelled(String),
    /// The subscription closed without a reason
    Closed,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Connection(e) => write!(f, "Connection error: {}", e),
            RemoteError::Status(code) => write!(f, "Request failed with status {}", code),
            RemoteError::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            RemoteError::Decode(e) => write!(f, "Failed to decode message: {}", e),
            RemoteError::Cancelled(e) => write!(f, "Subscription cancelled: {}", e),
            RemoteError::Closed => write!(f, "Subscription closed"),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Keyed access to one collection of the realtime store.
pub trait RemoteStore {
    /// Opens the change stream for the collection.
    fn subscribe(&self) -> impl Future<Output = Result<Subscription, RemoteError>> + Send;

    /// Stores `item` under `key`, overwriting whatever was there.
    fn write(&self, key: &str, item: &Item)
        -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Removes the record under `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
