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

//! Staging Area
//!
//! Pending per-path edits relative to the HEAD snapshot. Entries are always
//! kept in their minimal form: an edit that restores HEAD content disappears.

use crate::error::{VcsError, VcsResult};
use crate::objects::{ChangeStatus, CommitId, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One pending edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedChange {
    pub path: String,
    pub status: ChangeStatus,
    /// New content; `None` for a deletion
    pub content: Option<String>,
}

/// Status an edit would have against `head`, or `None` if it is a no-op
fn classify(head: &Snapshot, path: &str, content: Option<&str>) -> Option<ChangeStatus> {
    match (head.get(path), content) {
        (None, None) => None,
        (None, Some(_)) => Some(ChangeStatus::Added),
        (Some(_), None) => Some(ChangeStatus::Deleted),
        (Some(current), Some(new)) if current == new => None,
        (Some(_), Some(_)) => Some(ChangeStatus::Modified),
    }
}

/// Path -> pending change, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingArea {
    entries: BTreeMap<String, StagedChange>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit against `head`. Returns the resulting status, or `None`
    /// when the path no longer differs from HEAD.
    pub fn stage(
        &mut self,
        head: &Snapshot,
        path: &str,
        content: Option<String>,
    ) -> VcsResult<Option<ChangeStatus>> {
        if path.is_empty() {
            return Err(VcsError::InvalidPath("empty path".to_string()));
        }

        match classify(head, path, content.as_deref()) {
            Some(status) => {
                self.entries.insert(
                    path.to_string(),
                    StagedChange {
                        path: path.to_string(),
                        status,
                        content,
                    },
                );
                Ok(Some(status))
            }
            None => {
                self.entries.remove(path);
                Ok(None)
            }
        }
    }

    /// Discard a pending change. Returns it if one existed.
    pub fn unstage(&mut self, path: &str) -> Option<StagedChange> {
        self.entries.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&StagedChange> {
        self.entries.get(path)
    }

    /// Pending changes sorted by path
    pub fn list(&self) -> Vec<StagedChange> {
        self.entries.values().cloned().collect()
    }

    /// `(path, content)` edits in path order, ready for [`Snapshot::apply`]
    pub fn edits(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .values()
            .map(|c| (c.path.as_str(), c.content.as_deref()))
    }

    /// Re-evaluate every entry against a new HEAD
    pub fn rebase(&mut self, head: &Snapshot) {
        self.entries.retain(|path, change| {
            match classify(head, path, change.content.as_deref()) {
                Some(status) => {
                    change.status = status;
                    true
                }
                None => false,
            }
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-session editor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingState {
    pub current_branch: String,
    pub head_commit_id: CommitId,
    pub staged: StagingArea,
}

impl WorkingState {
    pub fn new(current_branch: impl Into<String>, head_commit_id: CommitId) -> Self {
        Self {
            current_branch: current_branch.into(),
            head_commit_id,
            staged: StagingArea::new(),
        }
    }
}
