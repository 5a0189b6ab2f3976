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

//! Content providers
//!
//! Source of the seed snapshot: a theme directory on disk or an in-memory map.

use crate::objects::Snapshot;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Content provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a UTF-8 text file: {0}")]
    NotText(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Supplies the files of a theme
pub trait ContentProvider {
    /// `/`-separated relative paths, sorted
    fn list_paths(&self) -> Result<Vec<String>, ProviderError>;

    /// Text content of one file
    fn read(&self, path: &str) -> Result<String, ProviderError>;

    /// Read every listed file into a snapshot. Files that are not UTF-8 text
    /// are skipped with a warning.
    fn snapshot(&self) -> Result<Snapshot, ProviderError> {
        let mut files = BTreeMap::new();
        for path in self.list_paths()? {
            match self.read(&path) {
                Ok(content) => {
                    files.insert(path, content);
                }
                Err(ProviderError::NotText(skipped)) => {
                    tracing::warn!(path = %skipped, "Skipping non-UTF-8 file");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Snapshot::new(files))
    }
}

/// Theme directory on the local filesystem. Hidden entries are ignored.
#[derive(Debug, Clone)]
pub struct FsContentProvider {
    root: PathBuf,
}

impl FsContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(ProviderError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl ContentProvider for FsContentProvider {
    fn list_paths(&self) -> Result<Vec<String>, ProviderError> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };

            let mut parts = Vec::new();
            for component in relative.components() {
                match component.as_os_str().to_str() {
                    Some(part) => parts.push(part),
                    None => {
                        tracing::warn!(path = ?entry.path(), "Skipping file with non-UTF-8 name");
                        parts.clear();
                        break;
                    }
                }
            }
            if !parts.is_empty() {
                paths.push(parts.join("/"));
            }
        }

        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<String, ProviderError> {
        let full = self.resolve(path)?;
        let bytes = std::fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound(path.to_string()),
            _ => ProviderError::Io {
                path: full.clone(),
                source,
            },
        })?;
        String::from_utf8(bytes).map_err(|_| ProviderError::NotText(path.to_string()))
    }
}

/// Fixed set of files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryContentProvider {
    files: BTreeMap<String, String>,
}

impl MemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for MemoryContentProvider {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        }
    }
}

impl ContentProvider for MemoryContentProvider {
    fn list_paths(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<String, ProviderError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }
}
