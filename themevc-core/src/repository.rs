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

//! Theme Repository - High-Level Git-Like Interface
//!
//! One `ThemeRepository` per editor session. It owns the commit graph, the
//! snapshot store and the working state, and serializes every mutation.
//!
//! State is held as `RwLock<Arc<RepoState>>`. Readers clone the `Arc` and see
//! a consistent view without holding the lock. Writers take the lock, do all
//! fallible work on a private copy and install it only on success, so a
//! failed operation never leaves partial changes behind.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::diff::{diff_snapshots, CommitDiff, DiffEngine, FileDiff};
use crate::error::{VcsError, VcsResult};
use crate::graph::CommitGraph;
use crate::history::HistoryDocument;
use crate::objects::{ChangeStatus, Commit, CommitId, Snapshot};
use crate::provider::{ContentProvider, ProviderError};
use crate::refs::{Branch, MAIN_BRANCH};
use crate::staging::{StagedChange, WorkingState};
use crate::stats::RepoStats;
use crate::store::SnapshotStore;
use chrono::Duration;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct RepoState {
    graph: Arc<CommitGraph>,
    store: Arc<SnapshotStore>,
    working: WorkingState,
}

impl RepoState {
    fn commit(&self, id: &CommitId) -> VcsResult<Arc<Commit>> {
        self.graph
            .get(id)
            .ok_or_else(|| VcsError::CorruptHistory(format!("missing commit {}", id.short())))
    }

    fn snapshot_of(&self, commit: &Commit) -> VcsResult<Arc<Snapshot>> {
        self.store.get(&commit.snapshot_id).ok_or_else(|| {
            VcsError::CorruptHistory(format!(
                "commit {} references missing snapshot {}",
                commit.short_id(),
                commit.snapshot_id.short()
            ))
        })
    }

    fn head(&self) -> VcsResult<Arc<Commit>> {
        self.commit(&self.working.head_commit_id)
    }

    fn head_snapshot(&self) -> VcsResult<Arc<Snapshot>> {
        let head = self.head()?;
        self.snapshot_of(&head)
    }

    fn working_snapshot(&self) -> VcsResult<Snapshot> {
        Ok(self.head_snapshot()?.apply(self.working.staged.edits()))
    }

    /// Record a commit on the current branch and move HEAD to it. A commit
    /// whose id is already taken is re-stamped 1 ms later until it is unique.
    fn append(&mut self, snapshot: Snapshot, mut commit: Commit) -> Arc<Commit> {
        while self.graph.contains(&commit.id) {
            commit = Commit::new(
                commit.parent_id,
                commit.branch,
                commit.author,
                commit.message,
                commit.timestamp + Duration::milliseconds(1),
                commit.snapshot_id,
                commit.changes,
            );
        }
        Arc::make_mut(&mut self.store).put(snapshot);
        let graph = Arc::make_mut(&mut self.graph);
        let commit = graph.insert(commit);
        graph
            .branches_mut()
            .insert(Branch::new(self.working.current_branch.as_str(), commit.id));
        self.working.head_commit_id = commit.id;
        self.working.staged.clear();
        commit
    }
}

/// Version-controlled theme file tree
pub struct ThemeRepository {
    state: RwLock<Arc<RepoState>>,
    config: EngineConfig,
    diff_engine: DiffEngine,
    clock: Arc<dyn Clock>,
}

impl ThemeRepository {
    /// Create a repository whose root commit holds `seed`
    pub fn init(seed: Snapshot) -> Self {
        Self::with_config(seed, EngineConfig::default())
    }

    pub fn with_config(seed: Snapshot, config: EngineConfig) -> Self {
        Self::with_clock(seed, config, Arc::new(SystemClock))
    }

    /// Create with an explicit clock (reproducible commit ids in tests)
    pub fn with_clock(seed: Snapshot, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let changes = diff_snapshots(&Snapshot::empty(), &seed);
        let root = Commit::new(
            None,
            MAIN_BRANCH,
            config.repository.system_author.as_str(),
            config.repository.initial_message.as_str(),
            clock.now(),
            seed.id(),
            changes,
        );

        let mut store = SnapshotStore::new();
        store.put(seed);

        let mut graph = CommitGraph::new();
        let root = graph.insert(root);
        graph.branches_mut().insert(Branch::new(MAIN_BRANCH, root.id));

        info!(
            commit_id = %root.short_id(),
            files = root.changes.len(),
            "Initialized theme repository"
        );

        Self::from_state(
            RepoState {
                graph: Arc::new(graph),
                store: Arc::new(store),
                working: WorkingState::new(MAIN_BRANCH, root.id),
            },
            config,
            clock,
        )
    }

    /// Seed the root commit from a content provider
    pub fn from_provider(
        provider: &dyn ContentProvider,
        config: EngineConfig,
    ) -> Result<Self, ProviderError> {
        let seed = provider.snapshot()?;
        Ok(Self::with_config(seed, config))
    }

    /// Restore a repository from an exported history document, on `main`
    pub fn from_history(json: &str, config: EngineConfig, clock: Arc<dyn Clock>) -> VcsResult<Self> {
        let (graph, store) = HistoryDocument::from_json(json)?.into_parts()?;
        let head = graph.branches().head_of(MAIN_BRANCH)?;

        info!(
            commits = graph.len(),
            branches = graph.branches().len(),
            "Loaded theme repository from history"
        );

        Ok(Self::from_state(
            RepoState {
                graph: Arc::new(graph),
                store: Arc::new(store),
                working: WorkingState::new(MAIN_BRANCH, head),
            },
            config,
            clock,
        ))
    }

    fn from_state(state: RepoState, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
            diff_engine: DiffEngine::with_config(config.diff_config()),
            config,
            clock,
        }
    }

    /// End the session, dropping the working state
    pub fn dispose(self) {
        let state = self.read();
        debug!(
            branch = %state.working.current_branch,
            discarded = state.working.staged.len(),
            "Disposed theme repository"
        );
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read(&self) -> Arc<RepoState> {
        self.state.read().clone()
    }

    /// Run `f` on a private copy of the state and install it on success.
    /// Used for working-state edits; the graph and store stay shared.
    fn mutate<T>(&self, f: impl FnOnce(&mut RepoState) -> VcsResult<T>) -> VcsResult<T> {
        let mut guard = self.state.write();
        let mut next = RepoState::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Check `plan` against the live state, then run the infallible `apply`
    /// in place. A rejected plan changes nothing. The graph and store are
    /// copied only while a reader still holds the previous state.
    fn transact<P, T>(
        &self,
        plan: impl FnOnce(&RepoState) -> VcsResult<P>,
        apply: impl FnOnce(&mut RepoState, P) -> T,
    ) -> VcsResult<T> {
        let mut guard = self.state.write();
        let planned = plan(&guard)?;
        Ok(apply(Arc::make_mut(&mut *guard), planned))
    }

    // === Staging ===

    /// Stage new content for `path` (`None` deletes it). Returns the staged
    /// status, or `None` when the path matches HEAD again.
    pub fn stage(&self, path: &str, content: Option<&str>) -> VcsResult<Option<ChangeStatus>> {
        self.mutate(|state| {
            let head = state.head_snapshot()?;
            let status = state
                .working
                .staged
                .stage(&head, path, content.map(str::to_string))?;
            debug!(path, status = ?status, "Staged change");
            Ok(status)
        })
    }

    /// Discard the pending change for `path`
    pub fn unstage(&self, path: &str) -> VcsResult<Option<StagedChange>> {
        self.mutate(|state| {
            let removed = state.working.staged.unstage(path);
            debug!(path, removed = removed.is_some(), "Unstaged change");
            Ok(removed)
        })
    }

    /// Pending changes sorted by path
    pub fn list_staged(&self) -> Vec<StagedChange> {
        self.read().working.staged.list()
    }

    /// Working content of a file: staged content if any, else HEAD content
    pub fn read_file(&self, path: &str) -> VcsResult<Option<String>> {
        let state = self.read();
        if let Some(change) = state.working.staged.get(path) {
            return Ok(change.content.clone());
        }
        Ok(state.head_snapshot()?.get(path).map(str::to_string))
    }

    /// HEAD snapshot with staged edits applied
    pub fn working_snapshot(&self) -> VcsResult<Snapshot> {
        self.read().working_snapshot()
    }

    /// Line diffs of the staged edits against HEAD
    pub fn diff_staged(&self) -> VcsResult<Vec<FileDiff>> {
        let state = self.read();
        let head = state.head_snapshot()?;
        let working = state.working_snapshot()?;
        Ok(self.diff_engine.diff_snapshot_files(&head, &working))
    }

    // === Commits ===

    /// Commit everything staged on the current branch
    pub fn commit(&self, message: &str, author: &str) -> VcsResult<Arc<Commit>> {
        self.validate_message(message)?;

        let planned = |state: &RepoState| -> VcsResult<(Snapshot, Commit)> {
            if state.working.staged.is_empty() {
                return Err(VcsError::EmptyCommit);
            }

            let head = state.head()?;
            let head_snapshot = state.snapshot_of(&head)?;
            let next = head_snapshot.apply(state.working.staged.edits());
            let changes = diff_snapshots(&head_snapshot, &next);
            if changes.is_empty() {
                return Err(VcsError::EmptyCommit);
            }

            let commit = Commit::new(
                Some(head.id),
                state.working.current_branch.as_str(),
                author,
                message,
                self.clock.now(),
                next.id(),
                changes,
            );
            Ok((next, commit))
        };

        self.transact(planned, |state, (next, commit)| {
            let commit = state.append(next, commit);
            info!(
                commit_id = %commit.short_id(),
                branch = %commit.branch,
                author = %commit.author,
                files = commit.changes.len(),
                "Created commit"
            );
            commit
        })
    }

    fn validate_message(&self, message: &str) -> VcsResult<()> {
        if message.trim().is_empty() {
            return Err(VcsError::InvalidMessage(
                "commit message must not be blank".to_string(),
            ));
        }
        let max = self.config.repository.max_message_len;
        if message.chars().count() > max {
            return Err(VcsError::InvalidMessage(format!(
                "commit message exceeds {} characters",
                max
            )));
        }
        Ok(())
    }

    /// History of `branch` (current branch when `None`), newest first
    pub fn history(&self, branch: Option<&str>) -> VcsResult<Vec<Arc<Commit>>> {
        let state = self.read();
        let branch = branch.unwrap_or(&state.working.current_branch);
        state.graph.history(branch)
    }

    /// History truncated to `max_count` entries
    pub fn log(&self, branch: Option<&str>, max_count: Option<usize>) -> VcsResult<Vec<Arc<Commit>>> {
        let mut history = self.history(branch)?;
        if let Some(max) = max_count {
            history.truncate(max);
        }
        Ok(history)
    }

    /// Append a commit restoring the tree of `commit_id`. Staged changes are
    /// discarded; earlier commits stay in history.
    pub fn rollback(&self, commit_id: &str) -> VcsResult<Arc<Commit>> {
        let planned = |state: &RepoState| -> VcsResult<(Arc<Commit>, Snapshot, Commit)> {
            let target = state.graph.resolve(commit_id)?;
            let target_snapshot = state.snapshot_of(&target)?;
            let head = state.head()?;
            let head_snapshot = state.snapshot_of(&head)?;

            let commit = Commit::new(
                Some(head.id),
                state.working.current_branch.as_str(),
                self.config.repository.system_author.as_str(),
                format!("Rollback to {}", target.short_id()),
                self.clock.now(),
                target.snapshot_id,
                diff_snapshots(&head_snapshot, &target_snapshot),
            );
            Ok((target, Snapshot::clone(&target_snapshot), commit))
        };

        self.transact(planned, |state, (target, snapshot, commit)| {
            let discarded = state.working.staged.len();
            let commit = state.append(snapshot, commit);
            info!(
                commit_id = %commit.short_id(),
                target = %target.short_id(),
                discarded_staged = discarded,
                files = commit.changes.len(),
                "Rolled back"
            );
            commit
        })
    }

    // === Branches ===

    /// Switch to `name`; staged edits are re-evaluated against its head
    pub fn checkout_branch(&self, name: &str) -> VcsResult<()> {
        self.mutate(|state| {
            let head_id = state.graph.branches().head_of(name)?;
            let head = state.commit(&head_id)?;
            let snapshot = state.snapshot_of(&head)?;

            state.working.current_branch = name.to_string();
            state.working.head_commit_id = head_id;
            state.working.staged.rebase(&snapshot);

            info!(
                branch = %name,
                commit_id = %head_id.short(),
                staged = state.working.staged.len(),
                "Checked out branch"
            );
            Ok(())
        })
    }

    /// Create a branch at HEAD
    pub fn create_branch(&self, name: &str) -> VcsResult<Branch> {
        self.transact(
            |state| {
                state.graph.branches().check_new(name)?;
                Ok(Branch::new(name, state.working.head_commit_id))
            },
            |state, branch| {
                info!(branch = %name, commit_id = %branch.head_commit_id.short(), "Created branch");
                Arc::make_mut(&mut state.graph)
                    .branches_mut()
                    .insert(branch.clone());
                branch
            },
        )
    }

    /// Delete a branch other than `main` and the current branch
    pub fn delete_branch(&self, name: &str) -> VcsResult<Branch> {
        self.transact(
            |state| {
                if name == state.working.current_branch {
                    return Err(VcsError::ProtectedBranch(format!(
                        "{} is the current branch",
                        name
                    )));
                }
                state.graph.branches().check_removable(name).cloned()
            },
            |state, branch| {
                Arc::make_mut(&mut state.graph).branches_mut().discard(name);
                info!(branch = %name, "Deleted branch");
                branch
            },
        )
    }

    /// All branches sorted by name
    pub fn branches(&self) -> Vec<Branch> {
        self.read().graph.branches().iter().cloned().collect()
    }

    pub fn current_branch(&self) -> String {
        self.read().working.current_branch.clone()
    }

    /// Commit HEAD points to
    pub fn head(&self) -> VcsResult<Arc<Commit>> {
        self.read().head()
    }

    // === Queries ===

    /// Look up a commit by full id or unique prefix
    pub fn show(&self, commit_id: &str) -> VcsResult<Arc<Commit>> {
        self.read().graph.resolve(commit_id)
    }

    /// File tree recorded by a commit
    pub fn snapshot_at(&self, commit_id: &str) -> VcsResult<Arc<Snapshot>> {
        let state = self.read();
        let commit = state.graph.resolve(commit_id)?;
        state.snapshot_of(&commit)
    }

    /// Line diffs between the trees of two commits
    pub fn diff_commits(&self, old_id: &str, new_id: &str) -> VcsResult<CommitDiff> {
        let state = self.read();
        let old = state.graph.resolve(old_id)?;
        let new = state.graph.resolve(new_id)?;
        let files = self
            .diff_engine
            .diff_snapshot_files(&*state.snapshot_of(&old)?, &*state.snapshot_of(&new)?);
        Ok(CommitDiff::new(old.id, new.id, files))
    }

    pub fn stats(&self) -> RepoStats {
        let state = self.read();
        RepoStats {
            total_commits: state.graph.len(),
            total_branches: state.graph.branches().len(),
            staged_changes: state.working.staged.len(),
            current_commit: state
                .graph
                .get(&state.working.head_commit_id)
                .map(|c| c.short_id()),
            current_branch: state.working.current_branch.clone(),
        }
    }

    // === Import / Export ===

    /// Serialize the whole history as pretty JSON
    pub fn export(&self) -> VcsResult<String> {
        let state = self.read();
        HistoryDocument::capture(&state.graph, &state.store)?.to_json()
    }

    /// Replace the whole history with an exported document. Staged changes
    /// are cleared; the current branch is kept when the document has it.
    pub fn import(&self, json: &str) -> VcsResult<()> {
        let (graph, store) = HistoryDocument::from_json(json)
            .and_then(HistoryDocument::into_parts)
            .map_err(|e| {
                warn!(error = %e, "Rejected history import");
                e
            })?;

        self.mutate(|state| {
            let branch = if graph.branches().contains(&state.working.current_branch) {
                state.working.current_branch.clone()
            } else {
                MAIN_BRANCH.to_string()
            };
            let head = graph.branches().head_of(&branch)?;

            info!(
                commits = graph.len(),
                branches = graph.branches().len(),
                branch = %branch,
                "Imported history"
            );

            state.graph = Arc::new(graph);
            state.store = Arc::new(store);
            state.working = WorkingState::new(branch, head);
            Ok(())
        })
    }
}

impl std::fmt::Debug for ThemeRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("ThemeRepository")
            .field("current_branch", &state.working.current_branch)
            .field("head", &state.working.head_commit_id)
            .field("commits", &state.graph.len())
            .field("staged", &state.working.staged.len())
            .finish()
    }
}
