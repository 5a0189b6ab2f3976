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

//! Repository statistics for status bars and dashboards

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only summary of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    pub total_commits: usize,
    pub total_branches: usize,
    pub staged_changes: usize,
    /// Short id of HEAD
    pub current_commit: Option<String>,
    pub current_branch: String,
}

impl RepoStats {
    /// Short id of HEAD, or `"None"`
    pub fn current_commit_label(&self) -> &str {
        self.current_commit.as_deref().unwrap_or("None")
    }
}

impl fmt::Display for RepoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Branch:         {}", self.current_branch)?;
        writeln!(f, "Commit:         {}", self.current_commit_label())?;
        writeln!(f, "Total commits:  {}", self.total_commits)?;
        writeln!(f, "Branches:       {}", self.total_branches)?;
        write!(f, "Staged changes: {}", self.staged_changes)
    }
}
