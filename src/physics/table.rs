// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Object identity to tree-node lookup table.

use std::collections::HashMap;
use std::hash::Hash;

/// Maps a caller's object identity to the tree node handle currently
/// tracking it.
///
/// Backed by a `HashMap` for expected O(1) lookups; every operation here is
/// permissive about unknown keys, leaving the "silently ignored" decision to
/// the manager that owns this table.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable<K: Eq + Hash> {
    nodes: HashMap<K, i32>,
}

impl<K: Eq + Hash + Clone> ObjectTable<K> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Returns the tree node handle for `key`, if tracked.
    pub fn get(&self, key: &K) -> Option<i32> {
        self.nodes.get(key).copied()
    }

    /// Returns `true` if `key` is already tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    /// Records that `key` now maps to `node`. Returns the previous mapping,
    /// if any, so the caller can detect a duplicate registration.
    pub fn insert(&mut self, key: K, node: i32) -> Option<i32> {
        self.nodes.insert(key, node)
    }

    /// Removes `key`'s mapping, returning the node handle it pointed to.
    pub fn remove(&mut self, key: &K) -> Option<i32> {
        self.nodes.remove(key)
    }

    /// Removes every mapping.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Returns the number of tracked objects.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no objects are tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over every tracked `(key, node)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &i32)> {
        self.nodes.iter()
    }
}
