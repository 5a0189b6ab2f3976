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

//! Subcommand implementations. Each returns the text to print.

use crate::config::CliConfig;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use themevc_core::{
    files_to_unified, format_stats, format_timestamp, summarize, to_unified, ChangeStatus, Commit,
    ContentProvider, DiffEngine, FsContentProvider, StagedChange, SystemClock, ThemeRepository,
    MAIN_BRANCH,
};

/// A repository loaded from (and saved back to) a history file
pub struct Session {
    pub repo: ThemeRepository,
    history_path: PathBuf,
}

impl Session {
    /// Load the history file and check out `branch`
    pub fn open(history_path: &Path, branch: &str, config: &CliConfig) -> Result<Self> {
        let json = std::fs::read_to_string(history_path).with_context(|| {
            format!(
                "cannot read history file {:?} (run `themevc init <dir>` first)",
                history_path
            )
        })?;
        let repo = ThemeRepository::from_history(
            &json,
            config.engine.clone(),
            Arc::new(SystemClock),
        )
        .with_context(|| format!("cannot load history from {:?}", history_path))?;

        if branch != MAIN_BRANCH {
            repo.checkout_branch(branch)?;
        }

        Ok(Self {
            repo,
            history_path: history_path.to_path_buf(),
        })
    }

    /// Write the exported history back to disk
    pub fn save(&self) -> Result<()> {
        let json = self.repo.export()?;
        std::fs::write(&self.history_path, json)
            .with_context(|| format!("cannot write history file {:?}", self.history_path))?;
        tracing::debug!(path = ?self.history_path, "Saved history");
        Ok(())
    }

    /// Stage the contents of a theme directory against HEAD. Tracked files
    /// that are present but no longer text are left unstaged.
    pub fn stage_directory(&self, dir: &Path) -> Result<Vec<StagedChange>> {
        let head = self.repo.working_snapshot()?;
        let provider = FsContentProvider::new(dir);
        let on_disk: HashSet<String> = provider
            .list_paths()
            .with_context(|| format!("cannot read theme directory {:?}", dir))?
            .into_iter()
            .collect();
        let working = provider
            .snapshot()
            .with_context(|| format!("cannot read theme directory {:?}", dir))?;

        for (path, content) in working.files() {
            self.repo.stage(path, Some(content.as_str()))?;
        }
        for path in head.paths().filter(|p| !working.contains(p)) {
            if on_disk.contains(path) {
                tracing::warn!(path, "Tracked file is no longer text; leaving it unstaged");
                continue;
            }
            self.repo.stage(path, None)?;
        }
        Ok(self.repo.list_staged())
    }
}

fn status_code(status: ChangeStatus) -> char {
    match status {
        ChangeStatus::Added => 'A',
        ChangeStatus::Modified => 'M',
        ChangeStatus::Deleted => 'D',
    }
}

fn commit_line(commit: &Commit) -> String {
    format!(
        "{} {} {} {}",
        commit.short_id(),
        format_timestamp(&commit.timestamp),
        commit.author,
        commit.summary()
    )
}

pub fn init(history: &Path, dir: &Path, force: bool, config: &CliConfig) -> Result<String> {
    if history.exists() && !force {
        bail!(
            "history file {:?} already exists (use --force to overwrite)",
            history
        );
    }

    let provider = FsContentProvider::new(dir);
    let repo = ThemeRepository::from_provider(&provider, config.engine.clone())
        .with_context(|| format!("cannot read theme directory {:?}", dir))?;
    let root = repo.head()?;

    std::fs::write(history, repo.export()?)
        .with_context(|| format!("cannot write history file {:?}", history))?;

    Ok(format!(
        "Initialized {:?} with {} files (root {})",
        history,
        root.changes.len(),
        root.short_id()
    ))
}

pub fn status(session: &Session, dir: &Path) -> Result<String> {
    let staged = session.stage_directory(dir)?;
    let mut out = format!("On branch {}\n", session.repo.current_branch());
    if staged.is_empty() {
        out.push_str("nothing to commit, working tree matches HEAD\n");
    }
    for change in staged {
        writeln!(out, "{} {}", status_code(change.status), change.path)?;
    }
    Ok(out)
}

pub fn diff(session: &Session, dir: &Path, path: Option<&str>) -> Result<String> {
    session.stage_directory(dir)?;
    let files: Vec<_> = session
        .repo
        .diff_staged()?
        .into_iter()
        .filter(|f| path.map_or(true, |p| f.path == p))
        .collect();

    let added: usize = files.iter().map(|f| f.summary.added).sum();
    let removed: usize = files.iter().map(|f| f.summary.removed).sum();

    let mut out = files_to_unified(&files);
    writeln!(
        out,
        "{} file(s) changed, {}",
        files.len(),
        format_stats(added, removed)
    )?;
    Ok(out)
}

pub fn diff_files(old: &Path, new: &Path, config: &CliConfig) -> Result<String> {
    let old_text =
        std::fs::read_to_string(old).with_context(|| format!("cannot read {:?}", old))?;
    let new_text =
        std::fs::read_to_string(new).with_context(|| format!("cannot read {:?}", new))?;

    let engine = DiffEngine::with_config(config.engine.diff_config());
    let hunks = engine.diff_lines(&old_text, &new_text);
    let summary = summarize(&hunks);

    let mut out = to_unified(
        &old.display().to_string(),
        &new.display().to_string(),
        &hunks,
    );
    writeln!(out, "{}", format_stats(summary.added, summary.removed))?;
    Ok(out)
}

pub fn commit(session: &Session, dir: &Path, message: &str, author: &str) -> Result<String> {
    session.stage_directory(dir)?;
    let commit = session.repo.commit(message, author)?;
    session.save()?;

    let mut out = format!("[{} {}] {}\n", commit.branch, commit.short_id(), commit.summary());
    for change in &commit.changes {
        writeln!(out, " {} {}", status_code(change.status), change.path)?;
    }
    Ok(out)
}

pub fn log(session: &Session, max_count: Option<usize>) -> Result<String> {
    let mut out = String::new();
    for commit in session.repo.log(None, max_count)? {
        writeln!(out, "{}", commit_line(&commit))?;
    }
    Ok(out)
}

pub fn show(session: &Session, commit_id: &str) -> Result<String> {
    let commit = session.repo.show(commit_id)?;

    let mut out = String::new();
    writeln!(out, "commit {}", commit.id.to_hex())?;
    if let Some(parent) = commit.parent_id {
        writeln!(out, "parent {}", parent.to_hex())?;
    }
    writeln!(out, "branch {}", commit.branch)?;
    writeln!(out, "author {}", commit.author)?;
    writeln!(out, "date   {}", format_timestamp(&commit.timestamp))?;
    writeln!(out)?;
    for line in commit.message.lines() {
        writeln!(out, "    {}", line)?;
    }
    writeln!(out)?;

    match commit.parent_id {
        Some(parent) => {
            let diff = session
                .repo
                .diff_commits(&parent.to_hex(), &commit.id.to_hex())?;
            out.push_str(&diff.to_unified());
            writeln!(
                out,
                "{} file(s) changed, {}",
                diff.stats.files_changed(),
                format_stats(diff.stats.lines_added, diff.stats.lines_removed)
            )?;
        }
        None => {
            for change in &commit.changes {
                writeln!(out, "{} {}", status_code(change.status), change.path)?;
            }
        }
    }
    Ok(out)
}

pub fn rollback(session: &Session, commit_id: &str) -> Result<String> {
    let commit = session.repo.rollback(commit_id)?;
    session.save()?;
    Ok(format!(
        "[{} {}] {} ({} file(s) changed)\n",
        commit.branch,
        commit.short_id(),
        commit.message,
        commit.changes.len()
    ))
}

pub fn branch(session: &Session, name: Option<&str>, delete: bool) -> Result<String> {
    match (name, delete) {
        (None, true) => bail!("--delete requires a branch name"),
        (None, false) => {
            let current = session.repo.current_branch();
            let mut out = String::new();
            for branch in session.repo.branches() {
                let marker = if branch.name == current { '*' } else { ' ' };
                writeln!(out, "{} {} {}", marker, branch.name, branch.head_commit_id.short())?;
            }
            Ok(out)
        }
        (Some(name), false) => {
            let branch = session.repo.create_branch(name)?;
            session.save()?;
            Ok(format!(
                "Created branch {} at {}\n",
                branch.name,
                branch.head_commit_id.short()
            ))
        }
        (Some(name), true) => {
            let branch = session.repo.delete_branch(name)?;
            session.save()?;
            Ok(format!(
                "Deleted branch {} (was {})\n",
                branch.name,
                branch.head_commit_id.short()
            ))
        }
    }
}

pub fn export(session: &Session, out: Option<&Path>) -> Result<String> {
    let json = session.repo.export()?;
    match out {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("cannot write {:?}", path))?;
            Ok(format!("Exported history to {:?}\n", path))
        }
        None => Ok(json + "\n"),
    }
}

pub fn import(history: &Path, file: &Path, config: &CliConfig) -> Result<String> {
    let json = std::fs::read_to_string(file).with_context(|| format!("cannot read {:?}", file))?;

    let repo = if history.exists() {
        let session = Session::open(history, MAIN_BRANCH, config)?;
        session.repo.import(&json)?;
        session.repo
    } else {
        ThemeRepository::from_history(&json, config.engine.clone(), Arc::new(SystemClock))?
    };

    let stats = repo.stats();
    std::fs::write(history, repo.export()?)
        .with_context(|| format!("cannot write history file {:?}", history))?;
    Ok(format!(
        "Imported {} commits on {} branches into {:?}\n",
        stats.total_commits, stats.total_branches, history
    ))
}

pub fn stats(session: &Session) -> Result<String> {
    Ok(format!("{}\n", session.repo.stats()))
}
