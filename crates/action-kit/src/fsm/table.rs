//! Keyed multi-map used to look transitions up by event type.

use std::collections::HashMap;
use std::hash::Hash;

/// Groups items under the key a getter derives from each item.
///
/// Items sharing a key keep their insertion order.
pub struct TableIndex<K, T> {
    index: HashMap<K, Vec<T>>,
    key_of: Box<dyn Fn(&T) -> K>,
}

impl<K: Eq + Hash, T> TableIndex<K, T> {
    pub fn new(key_of: impl Fn(&T) -> K + 'static) -> Self {
        Self {
            index: HashMap::new(),
            key_of: Box::new(key_of),
        }
    }

    pub fn add(&mut self, item: T) {
        let key = (self.key_of)(&item);
        self.index.entry(key).or_default().push(item);
    }

    /// Removes and returns the first item under `key` matching `predicate`.
    pub fn remove(&mut self, key: &K, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let items = self.index.get_mut(key)?;
        let position = items.iter().position(|item| predicate(item))?;
        let item = items.remove(position);
        if items.is_empty() {
            self.index.remove(key);
        }
        Some(item)
    }

    /// Items stored under `key`; empty when there are none.
    pub fn get(&self, key: &K) -> &[T] {
        self.index.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get_mut(&mut self, key: &K) -> &mut [T] {
        self.index
            .get_mut(key)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.index.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }
}

impl<K, T> std::fmt::Debug for TableIndex<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableIndex")
            .field("keys", &self.index.len())
            .finish()
    }
}
