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

//! Version-control error types

use thiserror::Error;

/// Result type for version-control operations
pub type VcsResult<T> = Result<T, VcsError>;

/// Errors surfaced by the theme version-control engine.
///
/// Every variant is a precondition or integrity violation reported to the
/// caller as-is. The operation that returned it left the repository unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// Commit attempted with nothing staged
    #[error("Nothing to commit: no staged changes")]
    EmptyCommit,

    /// Commit message blank or too long
    #[error("Invalid commit message: {0}")]
    InvalidMessage(String),

    /// Commit id (or prefix) does not resolve to a commit in the graph
    #[error("Unknown commit: {0}")]
    UnknownCommit(String),

    /// Branch does not exist
    #[error("Unknown branch: {0}")]
    UnknownBranch(String),

    /// Cycle or dangling parent found while walking history
    #[error("Corrupt history: {0}")]
    CorruptHistory(String),

    /// Import document is malformed or missing required fields
    #[error("Invalid history document: {0}")]
    Schema(String),

    /// Import document failed hash or reference checks
    #[error("History integrity check failed: {0}")]
    Integrity(String),

    /// Branch name already taken
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// Branch name rejected by validation
    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    /// Branch cannot be deleted (main or current branch)
    #[error("Branch is protected: {0}")]
    ProtectedBranch(String),

    /// File path rejected by staging
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<serde_json::Error> for VcsError {
    fn from(e: serde_json::Error) -> Self {
        VcsError::Schema(e.to_string())
    }
}
