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

//! Commit Graph
//!
//! Append-only DAG of immutable commits plus the branch table. Every walk is
//! guarded against revisits and dangling parents so a corrupt graph surfaces
//! as `CorruptHistory` instead of looping.

use crate::error::{VcsError, VcsResult};
use crate::objects::{Commit, CommitId, ObjectId, SHORT_ID_LEN};
use crate::refs::BranchTable;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    commits: HashMap<CommitId, Arc<Commit>>,
    branches: BranchTable,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit. Existing commits are never replaced.
    pub fn insert(&mut self, commit: Commit) -> Arc<Commit> {
        self.commits
            .entry(commit.id)
            .or_insert_with(|| Arc::new(commit))
            .clone()
    }

    pub fn get(&self, id: &CommitId) -> Option<Arc<Commit>> {
        self.commits.get(id).cloned()
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.commits.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn branches(&self) -> &BranchTable {
        &self.branches
    }

    pub fn branches_mut(&mut self) -> &mut BranchTable {
        &mut self.branches
    }

    pub fn commits(&self) -> impl Iterator<Item = &Arc<Commit>> {
        self.commits.values()
    }

    /// Look up a commit by full hex id or by a unique prefix of at least
    /// seven hex characters
    pub fn resolve(&self, id: &str) -> VcsResult<Arc<Commit>> {
        let id = id.trim();
        let unknown = || VcsError::UnknownCommit(id.to_string());

        if id.len() < SHORT_ID_LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(unknown());
        }

        if let Ok(oid) = ObjectId::from_hex(id) {
            return self.get(&oid).ok_or_else(unknown);
        }

        let mut matches = self.commits.values().filter(|c| c.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit.clone()),
            (Some(_), Some(_)) => Err(VcsError::UnknownCommit(format!("{} (ambiguous prefix)", id))),
            _ => Err(unknown()),
        }
    }

    /// Commits reachable from `start` by following parents, newest first
    pub fn walk(&self, start: CommitId) -> VcsResult<Vec<Arc<Commit>>> {
        let mut seen = HashSet::new();
        let mut history = Vec::new();
        let mut cursor = Some(start);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(VcsError::CorruptHistory(format!(
                    "commit {} revisited while walking from {}",
                    id.short(),
                    start.short()
                )));
            }
            let commit = self.get(&id).ok_or_else(|| {
                VcsError::CorruptHistory(format!(
                    "missing commit {} while walking from {}",
                    id.short(),
                    start.short()
                ))
            })?;
            cursor = commit.parent_id;
            history.push(commit);
        }

        Ok(history)
    }

    /// History of a branch, newest first
    pub fn history(&self, branch: &str) -> VcsResult<Vec<Arc<Commit>>> {
        let head = self.branches.head_of(branch)?;
        self.walk(head)
    }

    /// Distance of every commit from its root
    pub fn depths(&self) -> VcsResult<HashMap<CommitId, usize>> {
        let mut depths: HashMap<CommitId, usize> = HashMap::with_capacity(self.commits.len());

        for start in self.commits.keys() {
            let mut chain = Vec::new();
            let mut on_chain = HashSet::new();
            let mut cursor = Some(*start);
            let mut base = 0usize;

            while let Some(id) = cursor {
                if let Some(&depth) = depths.get(&id) {
                    base = depth + 1;
                    break;
                }
                if !on_chain.insert(id) {
                    return Err(VcsError::CorruptHistory(format!(
                        "parent cycle through commit {}",
                        id.short()
                    )));
                }
                let commit = self.commits.get(&id).ok_or_else(|| {
                    VcsError::CorruptHistory(format!("missing parent commit {}", id.short()))
                })?;
                chain.push(id);
                cursor = commit.parent_id;
            }

            for (offset, id) in chain.into_iter().rev().enumerate() {
                depths.insert(id, base + offset);
            }
        }

        Ok(depths)
    }

    /// Every commit ordered by depth from the root, ties broken by id
    pub fn topological(&self) -> VcsResult<Vec<Arc<Commit>>> {
        let depths = self.depths()?;
        let mut ordered: Vec<_> = self.commits.values().cloned().collect();
        ordered.sort_by_key(|c| (depths.get(&c.id).copied().unwrap_or(0), c.id));
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ChangeStatus, FileChange, Snapshot};
    use crate::refs::{Branch, MAIN_BRANCH};
    use chrono::{TimeZone, Utc};

    fn commit(parent: Option<CommitId>, message: &str, secs: i64) -> Commit {
        Commit::new(
            parent,
            MAIN_BRANCH,
            "tester",
            message,
            Utc.timestamp_opt(secs, 0).unwrap(),
            Snapshot::from_pairs([("f", message)]).id(),
            vec![FileChange::new("f", ChangeStatus::Modified)],
        )
    }

    fn linear(n: usize) -> (CommitGraph, Vec<CommitId>) {
        let mut graph = CommitGraph::new();
        let mut ids = Vec::new();
        let mut parent = None;
        for i in 0..n {
            let c = graph.insert(commit(parent, &format!("c{}", i), i as i64));
            parent = Some(c.id);
            ids.push(c.id);
        }
        graph.branches_mut().insert(Branch::new(MAIN_BRANCH, ids[n - 1]));
        (graph, ids)
    }

    #[test]
    fn test_history_newest_first() {
        let (graph, ids) = linear(4);
        let history: Vec<_> = graph.history(MAIN_BRANCH).unwrap().iter().map(|c| c.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(history, expected);

        assert!(matches!(
            graph.history("missing"),
            Err(VcsError::UnknownBranch(_))
        ));
    }

    #[test]
    fn test_walk_detects_missing_parent() {
        let mut graph = CommitGraph::new();
        let orphan = graph.insert(commit(Some(ObjectId::from_content(b"ghost")), "orphan", 1));
        assert!(matches!(
            graph.walk(orphan.id),
            Err(VcsError::CorruptHistory(_))
        ));
        assert!(matches!(graph.depths(), Err(VcsError::CorruptHistory(_))));
    }

    #[test]
    fn test_walk_detects_cycle() {
        let mut graph = CommitGraph::new();
        let a = commit(None, "a", 1);
        let mut b = commit(Some(a.id), "b", 2);
        let mut a_looped = a.clone();
        a_looped.parent_id = Some(b.id);
        b.parent_id = Some(a_looped.id);
        graph.insert(a_looped.clone());
        graph.insert(b);

        assert!(matches!(
            graph.walk(a_looped.id),
            Err(VcsError::CorruptHistory(_))
        ));
        assert!(matches!(graph.topological(), Err(VcsError::CorruptHistory(_))));
    }

    #[test]
    fn test_resolve_by_prefix() {
        let (graph, ids) = linear(3);
        let target = ids[1];

        assert_eq!(graph.resolve(&target.to_hex()).unwrap().id, target);
        assert_eq!(graph.resolve(&target.short()).unwrap().id, target);
        assert_eq!(graph.resolve(&target.to_hex()[..12]).unwrap().id, target);

        assert!(matches!(graph.resolve("abc"), Err(VcsError::UnknownCommit(_))));
        assert!(matches!(graph.resolve("not-a-hex-id"), Err(VcsError::UnknownCommit(_))));
        assert!(matches!(
            graph.resolve(&ObjectId::from_content(b"nope").to_hex()),
            Err(VcsError::UnknownCommit(_))
        ));
    }

    #[test]
    fn test_topological_order() {
        let (mut graph, ids) = linear(3);
        let side = graph.insert(commit(Some(ids[0]), "side", 10));

        let order: Vec<_> = graph.topological().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(order[0], ids[0]);
        let mut second_tier = vec![ids[1], side.id];
        second_tier.sort();
        assert_eq!(&order[1..3], &second_tier[..]);
        assert_eq!(order[3], ids[2]);
    }

    #[test]
    fn test_insert_never_replaces() {
        let mut graph = CommitGraph::new();
        let c = commit(None, "root", 0);
        let first = graph.insert(c.clone());
        let second = graph.insert(c);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(graph.len(), 1);
    }
}
