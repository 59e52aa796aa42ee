//! Component C: the connection registry.
//!
//! The upstream source keeps a hand-rolled singly-linked list and recurses
//! to tear it down (§9 Design Notes). This rewrite keeps the same
//! contract — insertion order is iteration order, every hash is unique —
//! on top of a `HashMap` for O(1) lookup plus a `Vec` carrying insertion
//! order, and tears down iteratively.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashMap;

use crate::connection::Connection;

/// Process-scoped mapping from identity hash to live connection.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, Connection>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), order: Vec::new() }
    }

    pub fn find(&self, hash: &str) -> Option<&Connection> {
        self.entries.get(hash)
    }

    pub fn find_mut(&mut self, hash: &str) -> Option<&mut Connection> {
        self.entries.get_mut(hash)
    }

    /// Appends a new connection. Panics in debug builds if the hash already
    /// exists; callers are expected to `find` first (§4.C).
    pub fn register(&mut self, connection: Connection) {
        debug_assert!(
            !self.entries.contains_key(&connection.hash),
            "registry already holds a connection for hash {}",
            connection.hash
        );
        let hash = connection.hash.clone();
        if self.entries.insert(hash.clone(), connection).is_none() {
            self.order.push(hash);
        }
    }

    /// Locates by hash, unlinks, and destroys the connection. Returns
    /// whether an entry was removed.
    pub fn deregister(&mut self, hash: &str) -> bool {
        match self.entries.remove(hash) {
            Some(connection) => {
                self.order.retain(|h| h != hash);
                connection.destroy();
                true
            },
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.order.iter().filter_map(|h| self.entries.get(h))
    }

    /// Destroys every registered connection in forward (insertion) order.
    /// Iterative, not recursive, to avoid stack blow-up on large clusters
    /// (§9 Design Notes).
    pub fn deinit(&mut self) {
        for hash in self.order.drain(..) {
            if let Some(connection) = self.entries.remove(&hash) {
                connection.destroy();
            }
        }
    }
}
