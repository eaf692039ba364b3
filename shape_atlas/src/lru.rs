// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Least-recently-used store with explicit eviction.

use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::hash::Hash;
use hashbrown::HashMap;

/// Null link in the recency list.
const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    /// `None` once the node has been returned to the free list.
    value: Option<V>,
    /// Next node towards the least recently used end.
    older: usize,
    /// Next node towards the most recently used end. Doubles as the free
    /// list link for vacant nodes.
    newer: usize,
}

/// An opaque position in an [`LruStore`]'s recency order.
///
/// Obtained from [`LruStore::oldest`] or [`LruStore::next`]. A cursor stays
/// valid while the store is only read, and across eviction of entries other
/// than the one it names. Any other mutation invalidates it; a stale cursor
/// resolves to `None` or to an arbitrary entry, never to undefined behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LruCursor(usize);

/// A mapping that remembers the order in which its entries were last used.
///
/// Lookups, inserts and evictions are O(1): a hash map indexes an arena of
/// nodes that are threaded onto a doubly linked recency list by index.
///
/// The store never evicts on its own. Capacity is the caller's business; the
/// recency order is exposed through cursors so the caller can decide what to
/// evict.
pub struct LruStore<K, V> {
    index: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    /// Least recently used node.
    oldest: usize,
    /// Most recently used node.
    newest: usize,
    /// Head of the vacant node list.
    free: usize,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Copy,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
            oldest: NIL,
            newest: NIL,
            free: NIL,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        self.nodes[idx].value.as_ref()
    }

    /// Returns the value for `key` without changing the recency order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.nodes[idx].value.as_ref()
    }

    /// Whether `key` is present. Does not change the recency order.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or overwrites the value for `key` and marks it most recently used.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            let previous = self.nodes[idx].value.replace(value);
            self.touch(idx);
            return previous;
        }

        let idx = self.alloc(key, value);
        self.link_newest(idx);
        self.index.insert(key, idx);
        None
    }

    /// Removes `key`. Returns `false` if it was not present.
    #[inline]
    pub fn evict(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let value = self.nodes[idx].value.take();
        self.nodes[idx].newer = self.free;
        self.free = idx;
        value
    }

    /// Position of the least recently used entry.
    #[inline]
    pub fn oldest(&self) -> Option<LruCursor> {
        (self.oldest != NIL).then_some(LruCursor(self.oldest))
    }

    /// The entry used immediately after the one at `cursor`.
    pub fn next(&self, cursor: LruCursor) -> Option<LruCursor> {
        let node = self.nodes.get(cursor.0)?;
        if node.value.is_none() || node.newer == NIL {
            return None;
        }
        Some(LruCursor(node.newer))
    }

    /// The key and value at `cursor`.
    pub fn entry(&self, cursor: LruCursor) -> Option<(K, &V)> {
        let node = self.nodes.get(cursor.0)?;
        node.value.as_ref().map(|value| (node.key, value))
    }

    /// Iterates from the least to the most recently used entry.
    pub fn iter_oldest(&self) -> LruIter<'_, K, V> {
        LruIter {
            store: self,
            cursor: self.oldest(),
        }
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.oldest = NIL;
        self.newest = NIL;
        self.free = NIL;
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        let node = Node {
            key,
            value: Some(value),
            older: NIL,
            newer: NIL,
        };
        if self.free == NIL {
            self.nodes.push(node);
            self.nodes.len() - 1
        } else {
            let idx = self.free;
            self.free = self.nodes[idx].newer;
            self.nodes[idx] = node;
            idx
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Node { older, newer, .. } = self.nodes[idx];
        if older == NIL {
            self.oldest = newer;
        } else {
            self.nodes[older].newer = newer;
        }
        if newer == NIL {
            self.newest = older;
        } else {
            self.nodes[newer].older = older;
        }
        self.nodes[idx].older = NIL;
        self.nodes[idx].newer = NIL;
    }

    fn link_newest(&mut self, idx: usize) {
        self.nodes[idx].older = self.newest;
        self.nodes[idx].newer = NIL;
        if self.newest == NIL {
            self.oldest = idx;
        } else {
            self.nodes[self.newest].newer = idx;
        }
        self.newest = idx;
    }

    fn touch(&mut self, idx: usize) {
        if self.newest != idx {
            self.unlink(idx);
            self.link_newest(idx);
        }
    }
}

impl<K, V> Default for LruStore<K, V>
where
    K: Hash + Eq + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LruStore")
            .field("len", &self.index.len())
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over an [`LruStore`] from least to most recently used.
#[derive(Debug)]
pub struct LruIter<'a, K, V> {
    store: &'a LruStore<K, V>,
    cursor: Option<LruCursor>,
}

impl<'a, K, V> Iterator for LruIter<'a, K, V>
where
    K: Hash + Eq + Copy,
{
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        self.cursor = self.store.next(cursor);
        self.store.entry(cursor)
    }
}
