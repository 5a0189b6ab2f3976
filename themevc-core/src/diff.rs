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

//! Diff Engine - Line Diffs and Hunks
//!
//! Computes minimal line-level edit scripts (Myers, via the `similar` crate)
//! and groups them into context-padded hunks using the unified-diff
//! numbering convention. Also provides file-level snapshot diffs, unified
//! rendering and patch application.
//!
//! Texts are split on `'\n'` only, so a trailing newline produces a final
//! empty line and `split_lines(t).join("\n") == t` for every input.

use crate::objects::{ChangeStatus, CommitId, FileChange, Snapshot};
use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffOp};
use std::cmp::Ordering;
use thiserror::Error;

/// Default number of unchanged lines shown around a change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Type of a diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Line exists in both old and new
    Unchanged,
    /// Line was added
    Added,
    /// Line was removed
    Removed,
}

/// A single line in a hunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub kind: LineKind,
    /// 1-based line number in the old text
    pub old_line: Option<usize>,
    /// 1-based line number in the new text
    pub new_line: Option<usize>,
    /// Line content without the newline
    pub content: String,
}

/// A contiguous, context-padded group of changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// First old line covered (1-based); the preceding line when `old_lines == 0`
    pub old_start: usize,
    pub old_lines: usize,
    /// First new line covered (1-based); the preceding line when `new_lines == 0`
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// `@@ -a,b +c,d @@`
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_lines, self.new_start, self.new_lines
        )
    }
}

/// Added/removed line counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    /// Net lines changed
    pub fn net_change(&self) -> i64 {
        self.added as i64 - self.removed as i64
    }

    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Line diff of one file between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub status: ChangeStatus,
    pub hunks: Vec<DiffHunk>,
    pub summary: DiffSummary,
}

/// Aggregate statistics over a set of file diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub files_added: usize,
    pub files_removed: usize,
    pub files_modified: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffStats {
    pub fn from_files(files: &[FileDiff]) -> Self {
        let mut stats = DiffStats::default();
        for file in files {
            match file.status {
                ChangeStatus::Added => stats.files_added += 1,
                ChangeStatus::Deleted => stats.files_removed += 1,
                ChangeStatus::Modified => stats.files_modified += 1,
            }
            stats.lines_added += file.summary.added;
            stats.lines_removed += file.summary.removed;
        }
        stats
    }

    pub fn files_changed(&self) -> usize {
        self.files_added + self.files_removed + self.files_modified
    }
}

/// Complete diff between two commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDiff {
    pub old_commit: CommitId,
    pub new_commit: CommitId,
    pub files: Vec<FileDiff>,
    pub stats: DiffStats,
}

impl CommitDiff {
    pub fn new(old_commit: CommitId, new_commit: CommitId, files: Vec<FileDiff>) -> Self {
        let stats = DiffStats::from_files(&files);
        Self {
            old_commit,
            new_commit,
            files,
            stats,
        }
    }

    /// Render every file as a unified diff
    pub fn to_unified(&self) -> String {
        files_to_unified(&self.files)
    }
}

/// Errors applying hunks to a text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Hunk {hunk} starts before the end of the previous hunk")]
    Overlap { hunk: usize },

    #[error("Hunk {hunk} refers to line {line} beyond the end of the text")]
    OutOfRange { hunk: usize, line: usize },

    #[error("Hunk {hunk} expected {expected:?} at line {line}, found {actual:?}")]
    Mismatch {
        hunk: usize,
        line: usize,
        expected: String,
        actual: String,
    },
}

/// Configuration for the diff engine
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Number of context lines around changes
    pub context_lines: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// One step of the edit script
#[derive(Debug, Clone, Copy)]
struct Edit<'a> {
    kind: LineKind,
    old_index: Option<usize>,
    new_index: Option<usize>,
    content: &'a str,
}

/// Stateless line diff engine
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Create a new diff engine with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn context_lines(&self) -> usize {
        self.config.context_lines
    }

    /// Diff two texts into hunks
    pub fn diff_lines(&self, old_text: &str, new_text: &str) -> Vec<DiffHunk> {
        if old_text == new_text {
            return Vec::new();
        }

        let old = split_lines(old_text);
        let new = split_lines(new_text);
        let edits = edit_script(&old, &new);

        group_hunks(&edits, self.config.context_lines)
    }

    /// Line diff for every changed path between two snapshots
    pub fn diff_snapshot_files(&self, old: &Snapshot, new: &Snapshot) -> Vec<FileDiff> {
        diff_snapshots(old, new)
            .into_iter()
            .map(|change| {
                let hunks = match change.status {
                    ChangeStatus::Added => {
                        whole_file_hunk(new.get(&change.path).unwrap_or(""), LineKind::Added)
                    }
                    ChangeStatus::Deleted => {
                        whole_file_hunk(old.get(&change.path).unwrap_or(""), LineKind::Removed)
                    }
                    ChangeStatus::Modified => self.diff_lines(
                        old.get(&change.path).unwrap_or(""),
                        new.get(&change.path).unwrap_or(""),
                    ),
                };
                let summary = summarize(&hunks);
                FileDiff {
                    path: change.path,
                    status: change.status,
                    hunks,
                    summary,
                }
            })
            .collect()
    }
}

/// Diff two texts with the default context window
pub fn diff_lines(old_text: &str, new_text: &str) -> Vec<DiffHunk> {
    DiffEngine::new().diff_lines(old_text, new_text)
}

/// Split on `'\n'`, keeping a trailing empty entry
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Count added and removed lines
pub fn summarize(hunks: &[DiffHunk]) -> DiffSummary {
    let mut summary = DiffSummary::default();
    for line in hunks.iter().flat_map(|h| &h.lines) {
        match line.kind {
            LineKind::Added => summary.added += 1,
            LineKind::Removed => summary.removed += 1,
            LineKind::Unchanged => {}
        }
    }
    summary
}

/// Human-readable counts, e.g. `+12 -4`
pub fn format_stats(added: usize, removed: usize) -> String {
    format!("+{} -{}", added, removed)
}

/// File-level set difference between two snapshots, sorted by path
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> Vec<FileChange> {
    let mut changes = Vec::new();
    let mut old_iter = old.files().iter().peekable();
    let mut new_iter = new.files().iter().peekable();

    loop {
        let order = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((old_path, _)), Some((new_path, _))) => old_path.cmp(new_path),
        };

        match order {
            Ordering::Less => {
                if let Some((path, _)) = old_iter.next() {
                    changes.push(FileChange::new(path.clone(), ChangeStatus::Deleted));
                }
            }
            Ordering::Greater => {
                if let Some((path, _)) = new_iter.next() {
                    changes.push(FileChange::new(path.clone(), ChangeStatus::Added));
                }
            }
            Ordering::Equal => {
                if let (Some((path, old_content)), Some((_, new_content))) =
                    (old_iter.next(), new_iter.next())
                {
                    if old_content != new_content {
                        changes.push(FileChange::new(path.clone(), ChangeStatus::Modified));
                    }
                }
            }
        }
    }

    changes
}

/// Apply hunks produced by [`diff_lines`] to the old text
pub fn apply_hunks(old_text: &str, hunks: &[DiffHunk]) -> Result<String, PatchError> {
    let old = split_lines(old_text);
    let mut out: Vec<&str> = Vec::with_capacity(old.len());
    let mut cursor = 0usize;

    for (hunk_idx, hunk) in hunks.iter().enumerate() {
        let start = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };

        if start < cursor {
            return Err(PatchError::Overlap { hunk: hunk_idx });
        }
        if start > old.len() {
            return Err(PatchError::OutOfRange {
                hunk: hunk_idx,
                line: start,
            });
        }

        out.extend_from_slice(&old[cursor..start]);
        cursor = start;

        for line in &hunk.lines {
            match line.kind {
                LineKind::Added => out.push(line.content.as_str()),
                LineKind::Unchanged | LineKind::Removed => {
                    let actual = *old.get(cursor).ok_or(PatchError::OutOfRange {
                        hunk: hunk_idx,
                        line: cursor + 1,
                    })?;
                    if actual != line.content {
                        return Err(PatchError::Mismatch {
                            hunk: hunk_idx,
                            line: cursor + 1,
                            expected: line.content.clone(),
                            actual: actual.to_string(),
                        });
                    }
                    if line.kind == LineKind::Unchanged {
                        out.push(actual);
                    }
                    cursor += 1;
                }
            }
        }
    }

    out.extend_from_slice(&old[cursor..]);
    Ok(out.join("\n"))
}

/// Format hunks as a unified diff
pub fn to_unified(old_path: &str, new_path: &str, hunks: &[DiffHunk]) -> String {
    let mut output = String::new();
    output.push_str(&format!("--- {}\n", old_path));
    output.push_str(&format!("+++ {}\n", new_path));

    for hunk in hunks {
        output.push_str(&hunk.header());
        output.push('\n');

        for line in &hunk.lines {
            let prefix = match line.kind {
                LineKind::Unchanged => ' ',
                LineKind::Added => '+',
                LineKind::Removed => '-',
            };
            output.push(prefix);
            output.push_str(&line.content);
            output.push('\n');
        }
    }

    output
}

/// Unified diff of several files, `/dev/null` standing in for a missing side
pub fn files_to_unified(files: &[FileDiff]) -> String {
    files
        .iter()
        .map(|file| {
            let (old_path, new_path) = match file.status {
                ChangeStatus::Added => ("/dev/null".to_string(), format!("b/{}", file.path)),
                ChangeStatus::Deleted => (format!("a/{}", file.path), "/dev/null".to_string()),
                ChangeStatus::Modified => (format!("a/{}", file.path), format!("b/{}", file.path)),
            };
            to_unified(&old_path, &new_path, &file.hunks)
        })
        .collect()
}

/// Minimal edit script with removals ordered before insertions inside every
/// run of changes
fn edit_script<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Edit<'a>> {
    let ops = similar::capture_diff_slices(Algorithm::Myers, old, new);

    let mut edits = Vec::with_capacity(old.len().max(new.len()));
    let mut removed: Vec<Edit<'a>> = Vec::new();
    let mut added: Vec<Edit<'a>> = Vec::new();

    let removal = |i: usize| Edit {
        kind: LineKind::Removed,
        old_index: Some(i),
        new_index: None,
        content: old[i],
    };
    let insertion = |i: usize| Edit {
        kind: LineKind::Added,
        old_index: None,
        new_index: Some(i),
        content: new[i],
    };

    for op in ops {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => {
                edits.append(&mut removed);
                edits.append(&mut added);
                edits.extend((0..len).map(|i| Edit {
                    kind: LineKind::Unchanged,
                    old_index: Some(old_index + i),
                    new_index: Some(new_index + i),
                    content: old[old_index + i],
                }));
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => removed.extend((old_index..old_index + old_len).map(removal)),
            DiffOp::Insert {
                new_index, new_len, ..
            } => added.extend((new_index..new_index + new_len).map(insertion)),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                removed.extend((old_index..old_index + old_len).map(removal));
                added.extend((new_index..new_index + new_len).map(insertion));
            }
        }
    }

    edits.append(&mut removed);
    edits.append(&mut added);
    edits
}

/// Group an edit script into hunks with `context` unchanged lines around
/// every change. Changes separated by at most `2 * context` unchanged lines
/// share a hunk.
fn group_hunks(edits: &[Edit<'_>], context: usize) -> Vec<DiffHunk> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, edit) in edits.iter().enumerate() {
        if edit.kind == LineKind::Unchanged {
            continue;
        }
        let start = i.saturating_sub(context);
        let end = (i + 1 + context).min(edits.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }

    let mut hunks = Vec::with_capacity(ranges.len());
    let mut scanned = 0usize;
    let mut old_before = 0usize;
    let mut new_before = 0usize;

    for (start, end) in ranges {
        for edit in &edits[scanned..start] {
            old_before += edit.old_index.is_some() as usize;
            new_before += edit.new_index.is_some() as usize;
        }

        let slice = &edits[start..end];
        let old_lines = slice.iter().filter(|e| e.old_index.is_some()).count();
        let new_lines = slice.iter().filter(|e| e.new_index.is_some()).count();

        hunks.push(DiffHunk {
            old_start: if old_lines == 0 { old_before } else { old_before + 1 },
            old_lines,
            new_start: if new_lines == 0 { new_before } else { new_before + 1 },
            new_lines,
            lines: slice
                .iter()
                .map(|e| DiffLine {
                    kind: e.kind,
                    old_line: e.old_index.map(|i| i + 1),
                    new_line: e.new_index.map(|i| i + 1),
                    content: e.content.to_string(),
                })
                .collect(),
        });

        old_before += old_lines;
        new_before += new_lines;
        scanned = end;
    }

    hunks
}

/// Single hunk covering a whole added or deleted file
fn whole_file_hunk(content: &str, kind: LineKind) -> Vec<DiffHunk> {
    let lines: Vec<DiffLine> = split_lines(content)
        .into_iter()
        .enumerate()
        .map(|(i, text)| DiffLine {
            kind,
            old_line: (kind == LineKind::Removed).then_some(i + 1),
            new_line: (kind == LineKind::Added).then_some(i + 1),
            content: text.to_string(),
        })
        .collect();
    let count = lines.len();

    let (old_start, old_lines, new_start, new_lines) = match kind {
        LineKind::Removed => (1, count, 0, 0),
        _ => (0, 0, 1, count),
    };

    vec![DiffHunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
        lines,
    }]
}
