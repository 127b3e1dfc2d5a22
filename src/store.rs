//! Local mirror of the remote collection.

use crate::models::Item;

/// Ordered in-memory list of items as last seen in a snapshot.
///
/// Only the sync listener replaces the contents, always wholesale. Everything
/// else gets read access.
#[derive(Debug, Default)]
pub struct LocalListStore {
    items: Vec<Item>,
    revision: u64,
}

impl LocalListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the list and appends `items` in order.
    pub(crate) fn replace_all(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.clear();
        self.items.extend(items);
        self.revision += 1;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item at a list position, as picked by a long-press.
    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of replacements so far; changes whenever a redraw is due.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
