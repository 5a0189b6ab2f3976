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

//! History Serializer
//!
//! Portable JSON form of the whole commit graph and every referenced snapshot.
//! Export is deterministic: branches by name, commits by depth then id,
//! snapshots by id. Import is strict and validates every hash and reference
//! before anything is handed back.

use crate::diff::diff_snapshots;
use crate::error::{VcsError, VcsResult};
use crate::graph::CommitGraph;
use crate::objects::{Commit, CommitId, Snapshot, SnapshotId};
use crate::refs::{validate_branch_name, Branch, MAIN_BRANCH};
use crate::store::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Exported snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub files: BTreeMap<String, String>,
}

/// Top-level export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryDocument {
    pub branches: Vec<Branch>,
    pub commits: Vec<Commit>,
    pub snapshots: Vec<SnapshotRecord>,
}

impl HistoryDocument {
    /// Capture a graph and the snapshots its commits reference
    pub fn capture(graph: &CommitGraph, store: &SnapshotStore) -> VcsResult<Self> {
        let branches: Vec<Branch> = graph.branches().iter().cloned().collect();
        let ordered = graph.topological()?;

        let mut referenced: Vec<SnapshotId> = ordered.iter().map(|c| c.snapshot_id).collect();
        referenced.sort();
        referenced.dedup();

        let snapshots = referenced
            .into_iter()
            .map(|id| {
                store
                    .get(&id)
                    .map(|s| SnapshotRecord {
                        id,
                        files: s.files().clone(),
                    })
                    .ok_or_else(|| {
                        VcsError::CorruptHistory(format!("missing snapshot {}", id.short()))
                    })
            })
            .collect::<VcsResult<Vec<_>>>()?;

        let commits = ordered.iter().map(|c| Commit::clone(c)).collect();

        Ok(Self {
            branches,
            commits,
            snapshots,
        })
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> VcsResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VcsError::CorruptHistory(format!("cannot serialize history: {}", e)))
    }

    /// Parse without validating references
    pub fn from_json(json: &str) -> VcsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every hash and reference, then build the graph and store
    pub fn into_parts(self) -> VcsResult<(CommitGraph, SnapshotStore)> {
        let store = self.load_snapshots()?;
        let commits = self.index_commits()?;

        for commit in &self.commits {
            verify_commit(commit, &commits, &store)?;
        }

        let mut graph = CommitGraph::new();
        for commit in self.commits {
            graph.insert(commit);
        }

        graph.depths().map_err(|e| match e {
            VcsError::CorruptHistory(msg) => VcsError::Integrity(msg),
            other => other,
        })?;

        let mut names = HashSet::new();
        for branch in self.branches {
            validate_branch_name(&branch.name).map_err(|e| VcsError::Integrity(e.to_string()))?;
            if !names.insert(branch.name.clone()) {
                return Err(integrity(format!("duplicate branch {:?}", branch.name)));
            }
            if !graph.contains(&branch.head_commit_id) {
                return Err(integrity(format!(
                    "branch {:?} points to missing commit {}",
                    branch.name,
                    branch.head_commit_id.short()
                )));
            }
            graph.branches_mut().insert(branch);
        }

        if !graph.branches().contains(MAIN_BRANCH) {
            return Err(integrity(format!("missing {:?} branch", MAIN_BRANCH)));
        }

        Ok((graph, store))
    }

    fn load_snapshots(&self) -> VcsResult<SnapshotStore> {
        let mut store = SnapshotStore::new();
        for record in &self.snapshots {
            if store.contains(&record.id) {
                return Err(integrity(format!("duplicate snapshot {}", record.id.short())));
            }
            let snapshot = Snapshot::new(record.files.clone());
            if snapshot.id() != record.id {
                return Err(integrity(format!(
                    "snapshot {} hashes to {}",
                    record.id.short(),
                    snapshot.id().short()
                )));
            }
            store.put(snapshot);
        }
        Ok(store)
    }

    fn index_commits(&self) -> VcsResult<HashMap<CommitId, &Commit>> {
        let mut index = HashMap::with_capacity(self.commits.len());
        for commit in &self.commits {
            if index.insert(commit.id, commit).is_some() {
                return Err(integrity(format!("duplicate commit {}", commit.short_id())));
            }
        }
        Ok(index)
    }
}

fn integrity(msg: String) -> VcsError {
    VcsError::Integrity(msg)
}

fn verify_commit(
    commit: &Commit,
    commits: &HashMap<CommitId, &Commit>,
    store: &SnapshotStore,
) -> VcsResult<()> {
    let snapshot = store.get(&commit.snapshot_id).ok_or_else(|| {
        integrity(format!(
            "commit {} references missing snapshot {}",
            commit.short_id(),
            commit.snapshot_id.short()
        ))
    })?;

    let parent_snapshot = match commit.parent_id {
        None => Snapshot::empty(),
        Some(parent_id) => {
            let parent = commits.get(&parent_id).ok_or_else(|| {
                integrity(format!(
                    "commit {} references missing parent {}",
                    commit.short_id(),
                    parent_id.short()
                ))
            })?;
            let found = store.get(&parent.snapshot_id).ok_or_else(|| {
                integrity(format!(
                    "commit {} references missing snapshot {}",
                    parent.short_id(),
                    parent.snapshot_id.short()
                ))
            })?;
            Snapshot::clone(&found)
        }
    };

    if !commit.verify_id() {
        return Err(integrity(format!(
            "commit {} does not match its recomputed id",
            commit.short_id()
        )));
    }

    if commit.changes != diff_snapshots(&parent_snapshot, &snapshot) {
        return Err(integrity(format!(
            "commit {} changes do not match its snapshots",
            commit.short_id()
        )));
    }

    Ok(())
}
