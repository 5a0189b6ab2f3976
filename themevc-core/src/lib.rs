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

//! Theme Version Control
//!
//! An embeddable, Git-like version control engine for theme file trees:
//! stage edits, commit them, browse history, view line diffs, roll back,
//! branch, and round-trip the whole history through a portable JSON document.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        ThemeRepository                         │
//! │        RwLock<Arc<RepoState>>  (copy-on-write snapshots)       │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │ WorkingState │   │ CommitGraph  │   │SnapshotStore │        │
//! │  │  + staging   │──►│ commits +    │──►│ BLAKE3-keyed │        │
//! │  │              │   │ branches     │   │ file trees   │        │
//! │  └──────────────┘   └──────────────┘   └──────────────┘        │
//! │         │                  │                   │               │
//! │         ▼                  ▼                   ▼               │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │  DiffEngine  │   │   History    │   │   RepoStats  │        │
//! │  │ (Myers/hunks)│   │ export/import│   │   (queries)  │        │
//! │  └──────────────┘   └──────────────┘   └──────────────┘        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use themevc_core::{Snapshot, ThemeRepository};
//!
//! let repo = ThemeRepository::init(Snapshot::from_pairs([("a.css", "body{}")]));
//! repo.stage("a.css", Some("body{color:red}")).unwrap();
//! let commit = repo.commit("style tweak", "alice").unwrap();
//!
//! assert_eq!(repo.history(None).unwrap()[0].id, commit.id);
//! ```

pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod graph;
pub mod history;
pub mod objects;
pub mod provider;
pub mod refs;
pub mod repository;
pub mod staging;
pub mod stats;
pub mod store;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use config::{ConfigError, DiffSettings, EngineConfig, RepositorySettings};
pub use diff::{
    apply_hunks, diff_lines, diff_snapshots, files_to_unified, format_stats, split_lines,
    summarize, to_unified, CommitDiff, DiffConfig, DiffEngine, DiffHunk, DiffLine, DiffStats,
    DiffSummary, FileDiff, LineKind, PatchError,
};
pub use error::{VcsError, VcsResult};
pub use graph::CommitGraph;
pub use history::{HistoryDocument, SnapshotRecord};
pub use objects::{
    format_timestamp, ChangeStatus, Commit, CommitId, FileChange, ObjectId, ParseError, Snapshot,
    SnapshotId,
};
pub use provider::{ContentProvider, FsContentProvider, MemoryContentProvider, ProviderError};
pub use refs::{validate_branch_name, Branch, BranchTable, MAIN_BRANCH};
pub use repository::ThemeRepository;
pub use staging::{StagedChange, StagingArea, WorkingState};
pub use stats::RepoStats;
pub use store::SnapshotStore;
