// Copyright 2025 Sushanth (https://github.com/sushanthpy)
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

//! Snapshot Store - Content-Addressable Storage
//!
//! Maps snapshot hash -> full file-tree snapshot. Identical trees are stored
//! once; snapshots are shared as `Arc` values and never mutated.

use crate::objects::{Snapshot, SnapshotId};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory snapshot store
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshots: HashMap<SnapshotId, Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot, returning the shared copy (deduplicated by id)
    pub fn put(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.snapshots
            .entry(snapshot.id())
            .or_insert_with(|| Arc::new(snapshot))
            .clone()
    }

    pub fn get(&self, id: &SnapshotId) -> Option<Arc<Snapshot>> {
        self.snapshots.get(id).cloned()
    }

    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.snapshots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_deduplicates() {
        let mut store = SnapshotStore::new();

        let first = store.put(Snapshot::from_pairs([("a.css", "body{}")]));
        let second = store.put(Snapshot::from_pairs([("a.css", "body{}")]));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
        assert!(store.contains(&first.id()));
    }

    #[test]
    fn test_get() {
        let mut store = SnapshotStore::new();
        let snap = store.put(Snapshot::from_pairs([("a.css", "12"), ("b.js", "345")]));
        store.put(Snapshot::empty());

        assert_eq!(store.get(&snap.id()).unwrap().get("b.js"), Some("345"));
        assert!(store.get(&Snapshot::from_pairs([("x", "y")]).id()).is_none());
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }
}
