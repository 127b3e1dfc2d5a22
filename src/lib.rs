//! itemsync
//!
//! A list of items mirrored from a remote realtime key-value store. User
//! actions become keyed writes and deletes; the store pushes a full snapshot
//! after every change and the local list is rebuilt from it.

pub mod actions;
pub mod config;
pub mod listener;
pub mod models;
pub mod notice;
pub mod remote;
pub mod server;
pub mod snapshot;
pub mod store;
pub mod validation;

pub use actions::{plan_update, ActionError, ItemActions, UpdateOutcome, UpdateStep};
pub use config::{Config, ConfigError, ConfigSource, ConfigValue};
pub use listener::{ListenerEvent, ListenerState, SyncListener};
pub use models::Item;
pub use notice::{Notice, NoticeSink};
pub use remote::{HttpRemote, MemoryStore, RemoteError, RemoteStore, Subscription};
pub use snapshot::{Child, Snapshot};
pub use store::LocalListStore;
pub use validation::{validate, ValidationError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
