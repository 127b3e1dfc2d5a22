//! Server-side modules for the itemsync realtime store.

pub mod routes;
pub mod storage;

pub use routes::{router, AppState};
pub use storage::{open_database, ItemTable, StorageError};
