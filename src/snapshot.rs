//! Full-state snapshots of a remote collection.
//!
//! A snapshot is the complete, ordered list of `(key, record)` children
//! under a collection path. It is delivered on every change, so consumers
//! never have to merge partial updates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::Item;
use crate::validation::is_numeric_id;

/// One child of the collection: the storage key and its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub key: String,
    #[serde(default)]
    pub value: Item,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub children: Vec<Child>,
}

impl Snapshot {
    /// Builds a snapshot, ordering children by [`compare_keys`].
    pub fn from_children(children: impl IntoIterator<Item = (String, Item)>) -> Self {
        let mut children: Vec<Child> = children
            .into_iter()
            .map(|(key, value)| Child { key, value })
            .collect();
        children.sort_by(|a, b| compare_keys(&a.key, &b.key));
        Self { children }
    }

    /// Decoded records in child order.
    pub fn items(&self) -> Vec<Item> {
        self.children.iter().map(|c| c.value.clone()).collect()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.children.into_iter().map(|c| c.value).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.children
            .iter()
            .find(|c| c.key == key)
            .map(|c| &c.value)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Child key ordering of the realtime store.
///
/// Digit-only keys come first in numeric order, compared without parsing so
/// arbitrarily long ids work. Everything else follows in byte order.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (is_numeric_id(a), is_numeric_id(b)) {
        (true, true) => {
            let a_digits = a.trim_start_matches('0');
            let b_digits = b.trim_start_matches('0');
            a_digits
                .len()
                .cmp(&b_digits.len())
                .then_with(|| a_digits.cmp(b_digits))
                .then_with(|| a.len().cmp(&b.len()))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.children.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_numeric_keys_sort_numerically() {
        let snapshot = Snapshot::from_children(
            ["10", "9", "100", "1"]
                .into_iter()
                .map(|k| (k.to_string(), Item::new(k, "x"))),
        );
        assert_eq!(keys(&snapshot), vec!["1", "9", "10", "100"]);
    }

    #[test]
    fn test_numeric_keys_before_text_keys() {
        let snapshot = Snapshot::from_children(
            ["b", "2", "a", "1"]
                .into_iter()
                .map(|k| (k.to_string(), Item::default())),
        );
        assert_eq!(keys(&snapshot), vec!["1", "2", "a", "b"]);
    }

    #[test]
    fn test_leading_zeros_tiebreak() {
        assert_eq!(compare_keys("7", "007"), Ordering::Less);
        assert_eq!(compare_keys("007", "8"), Ordering::Less);
        assert_eq!(compare_keys("5", "5"), Ordering::Equal);
    }

    #[test]
    fn test_items_keep_child_order() {
        let snapshot = Snapshot::from_children(vec![
            ("3".to_string(), Item::new("3", "C")),
            ("1".to_string(), Item::new("1", "A")),
        ]);
        assert_eq!(
            snapshot.items(),
            vec![Item::new("1", "A"), Item::new("3", "C")]
        );
        assert_eq!(snapshot.get("3").map(|i| i.name.as_str()), Some("C"));
        assert!(snapshot.get("2").is_none());
    }

    #[test]
    fn test_child_without_value_decodes_to_default() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"children":[{"key":"4"}]}"#).unwrap();
        assert_eq!(snapshot.children[0].value, Item::default());
    }
}
