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

//! Branches
//!
//! Mutable named pointers into the immutable commit graph.

use crate::error::{VcsError, VcsResult};
use crate::objects::CommitId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the branch that always exists
pub const MAIN_BRANCH: &str = "main";

/// Branch - mutable reference to latest commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Branch {
    pub name: String,
    pub head_commit_id: CommitId,
}

impl Branch {
    pub fn new(name: impl Into<String>, head_commit_id: CommitId) -> Self {
        Self {
            name: name.into(),
            head_commit_id,
        }
    }
}

/// Branch name -> branch, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTable {
    branches: BTreeMap<String, Branch>,
}

impl BranchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Branch> {
        self.branches.get(name)
    }

    pub fn head_of(&self, name: &str) -> VcsResult<CommitId> {
        self.get(name)
            .map(|b| b.head_commit_id)
            .ok_or_else(|| VcsError::UnknownBranch(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// Fails if the name is invalid or already taken
    pub fn check_new(&self, name: &str) -> VcsResult<()> {
        validate_branch_name(name)?;
        if self.contains(name) {
            return Err(VcsError::BranchExists(name.to_string()));
        }
        Ok(())
    }

    /// Fails for `main` and for unknown branches
    pub fn check_removable(&self, name: &str) -> VcsResult<&Branch> {
        if name == MAIN_BRANCH {
            return Err(VcsError::ProtectedBranch(name.to_string()));
        }
        self.get(name)
            .ok_or_else(|| VcsError::UnknownBranch(name.to_string()))
    }

    /// Create or move a branch. Callers validate first.
    pub(crate) fn insert(&mut self, branch: Branch) {
        self.branches.insert(branch.name.clone(), branch);
    }

    pub(crate) fn discard(&mut self, name: &str) -> Option<Branch> {
        self.branches.remove(name)
    }

    /// Branches sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Validate a branch name (similar to Git's rules)
pub fn validate_branch_name(name: &str) -> VcsResult<()> {
    let invalid = |reason: &str| -> VcsResult<()> {
        Err(VcsError::InvalidBranchName(format!("{:?}: {}", name, reason)))
    };

    if name.is_empty() {
        return invalid("empty name");
    }

    if name.starts_with('.') || name.ends_with('.') {
        return invalid("cannot start or end with '.'");
    }

    if name.starts_with('/') || name.ends_with('/') {
        return invalid("cannot start or end with '/'");
    }

    if name.contains("..") {
        return invalid("cannot contain '..'");
    }

    if name.contains("//") {
        return invalid("cannot contain '//'");
    }

    if name.chars().any(char::is_whitespace) {
        return invalid("cannot contain whitespace");
    }

    let invalid_chars = ['~', '^', ':', '\\', '?', '*', '['];
    for c in invalid_chars {
        if name.contains(c) {
            return invalid(&format!("cannot contain '{}'", c));
        }
    }

    Ok(())
}
