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

//! Version-Control Object Types
//!
//! Content-addressable objects: Snapshot and Commit.
//! All objects are immutable once created; "changing" a snapshot produces a
//! new value with a new id.

use blake3::Hasher;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Number of hex characters in a short id (like git's abbreviated hash)
pub const SHORT_ID_LEN: usize = 7;

/// Object ID - BLAKE3 hash (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub [u8; 32]);

/// Id of a commit
pub type CommitId = ObjectId;

/// Id of a snapshot
pub type SnapshotId = ObjectId;

impl ObjectId {
    /// Create from content (content-addressable)
    #[cfg(test)]
    pub(crate) fn from_content(content: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Abbreviated hex form used in messages and the UI
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_ID_LEN);
        hex
    }

    /// Full hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(hex_str).map_err(|_| ParseError::InvalidHex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseError::InvalidLength)?;
        Ok(Self(arr))
    }

    /// Check if this ID starts with the given hex prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(&prefix.to_ascii_lowercase())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ObjectId::from_hex(&raw)
            .map_err(|e| serde::de::Error::custom(format!("{}: {:?}", e, raw)))
    }
}

/// Parse errors for ObjectId
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid hex string")]
    InvalidHex,
    #[error("Invalid length (expected 32 bytes)")]
    InvalidLength,
}

/// Hashes a sequence of length-prefixed fields so that field boundaries
/// are part of the digest.
struct FieldHasher(Hasher);

impl FieldHasher {
    fn new(domain: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(domain.as_bytes());
        Self(hasher)
    }

    fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(&(bytes.len() as u64).to_le_bytes());
        self.0.update(bytes);
        self
    }

    fn finish(&self) -> ObjectId {
        ObjectId(self.0.finalize().into())
    }
}

/// Complete, immutable path -> content mapping for one point in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: SnapshotId,
    files: BTreeMap<String, String>,
}

impl Snapshot {
    /// Create a snapshot, computing its content hash
    pub fn new(files: BTreeMap<String, String>) -> Self {
        let id = Self::compute_id(&files);
        Self { id, files }
    }

    /// Snapshot with no files
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    /// Build from `(path, content)` pairs; later duplicates win
    pub fn from_pairs<I, P, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        )
    }

    /// Order-independent hash over the sorted path/content pairs
    pub fn compute_id(files: &BTreeMap<String, String>) -> SnapshotId {
        let mut hasher = FieldHasher::new("themevc:snapshot");
        hasher.field(&(files.len() as u64).to_le_bytes());
        for (path, content) in files {
            hasher.field(path.as_bytes()).field(content.as_bytes());
        }
        hasher.finish()
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Content of a file, if present
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Sorted file paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// New snapshot with edits applied. `None` content removes the path.
    pub fn apply<'a, I>(&self, edits: I) -> Snapshot
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut files = self.files.clone();
        for (path, content) in edits {
            match content {
                Some(text) => {
                    files.insert(path.to_string(), text.to_string());
                }
                None => {
                    files.remove(path);
                }
            }
        }
        Snapshot::new(files)
    }
}

/// How a file differs between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One path in a commit's change list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Commit object - versioned snapshot with a single parent link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Commit {
    /// Derived from parent, snapshot, message, timestamp and author
    pub id: CommitId,
    /// None for a root commit; the key itself is required
    #[serde(deserialize_with = "nullable")]
    pub parent_id: Option<CommitId>,
    /// Branch that was current when the commit was created
    pub branch: String,
    pub author: String,
    pub message: String,
    /// Millisecond precision, UTC
    #[serde(with = "canonical_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub snapshot_id: SnapshotId,
    /// Set difference between the parent's snapshot and this one, sorted by path
    pub changes: Vec<FileChange>,
}

impl Commit {
    /// Create a commit, truncating the timestamp to milliseconds and deriving the id
    pub fn new(
        parent_id: Option<CommitId>,
        branch: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        snapshot_id: SnapshotId,
        changes: Vec<FileChange>,
    ) -> Self {
        let author = author.into();
        let message = message.into();
        let timestamp = timestamp.trunc_subsecs(3);
        let id = Self::compute_id(parent_id.as_ref(), &snapshot_id, &message, &timestamp, &author);

        Self {
            id,
            parent_id,
            branch: branch.into(),
            author,
            message,
            timestamp,
            snapshot_id,
            changes,
        }
    }

    /// Deterministic id: identical inputs always reproduce the same id
    pub fn compute_id(
        parent_id: Option<&CommitId>,
        snapshot_id: &SnapshotId,
        message: &str,
        timestamp: &DateTime<Utc>,
        author: &str,
    ) -> CommitId {
        let parent_hex = parent_id.map(ObjectId::to_hex).unwrap_or_default();
        FieldHasher::new("themevc:commit")
            .field(parent_hex.as_bytes())
            .field(snapshot_id.to_hex().as_bytes())
            .field(message.as_bytes())
            .field(format_timestamp(timestamp).as_bytes())
            .field(author.as_bytes())
            .finish()
    }

    /// Whether the stored id matches the one recomputed from the fields
    pub fn verify_id(&self) -> bool {
        let expected = Self::compute_id(
            self.parent_id.as_ref(),
            &self.snapshot_id,
            &self.message,
            &self.timestamp,
            &self.author,
        );
        expected == self.id
    }

    pub fn short_id(&self) -> String {
        self.id.short()
    }

    /// Check if this is a root commit
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// RFC 3339, UTC, millisecond precision (`2025-01-01T00:00:00.000Z`)
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

mod canonical_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_object_id_hex_roundtrip() {
        let oid = ObjectId::from_content(b"test");
        let parsed = ObjectId::from_hex(&oid.to_hex()).unwrap();
        assert_eq!(oid, parsed);
        assert_eq!(ObjectId::from_hex("zz"), Err(ParseError::InvalidHex));
        assert_eq!(ObjectId::from_hex("abcd"), Err(ParseError::InvalidLength));
    }

    #[test]
    fn test_object_id_short() {
        let oid = ObjectId::from_content(b"test");
        assert_eq!(oid.short().len(), SHORT_ID_LEN);
        assert!(oid.starts_with(&oid.short()));
        assert!(oid.starts_with(&oid.short().to_uppercase()));
    }

    #[test]
    fn test_object_id_serializes_as_hex() {
        let oid = ObjectId::from_content(b"x");
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, format!("\"{}\"", oid.to_hex()));
        assert!(serde_json::from_str::<ObjectId>("\"not-hex\"").is_err());
    }

    #[test]
    fn test_snapshot_id_is_order_independent() {
        let a = Snapshot::from_pairs([("a.css", "body{}"), ("b.html", "<p>")]);
        let b = Snapshot::from_pairs([("b.html", "<p>"), ("a.css", "body{}")]);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_snapshot_id_respects_field_boundaries() {
        let a = Snapshot::from_pairs([("ab", "c")]);
        let b = Snapshot::from_pairs([("a", "bc")]);
        assert_ne!(a.id(), b.id());
        assert_ne!(Snapshot::empty().id(), Snapshot::from_pairs([("", "")]).id());
    }

    #[test]
    fn test_snapshot_apply_creates_new_value() {
        let base = Snapshot::from_pairs([("a.css", "body{}"), ("old.js", "x")]);
        let next = base.apply([("a.css", Some("body{color:red}")), ("old.js", None), ("new.js", Some("y"))]);

        assert_eq!(base.get("a.css"), Some("body{}"));
        assert!(base.contains("old.js"));
        assert_eq!(next.get("a.css"), Some("body{color:red}"));
        assert!(!next.contains("old.js"));
        assert_eq!(next.paths().collect::<Vec<_>>(), vec!["a.css", "new.js"]);
        assert_ne!(base.id(), next.id());
    }

    #[test]
    fn test_commit_id_deterministic() {
        let snap = Snapshot::from_pairs([("a.css", "body{}")]);
        let c1 = Commit::new(None, "main", "alice", "Initial", ts(), snap.id(), vec![]);
        let c2 = Commit::new(None, "main", "alice", "Initial", ts(), snap.id(), vec![]);
        let c3 = Commit::new(None, "main", "bob", "Initial", ts(), snap.id(), vec![]);

        assert_eq!(c1.id, c2.id);
        assert_ne!(c1.id, c3.id);
        assert!(c1.verify_id());
        assert!(c1.is_root());
    }

    #[test]
    fn test_commit_timestamp_truncated_to_millis() {
        let precise = ts() + chrono::Duration::nanoseconds(1_234_567);
        let commit = Commit::new(None, "main", "a", "m", precise, ObjectId::default(), vec![]);
        assert_eq!(commit.timestamp.timestamp_subsec_nanos(), 1_000_000);
        assert_eq!(format_timestamp(&commit.timestamp), "2025-01-01T12:00:00.001Z");
    }

    #[test]
    fn test_commit_json_shape() {
        let parent = ObjectId::from_content(b"parent");
        let commit = Commit::new(
            Some(parent),
            "main",
            "alice",
            "style tweak\n\nlonger body",
            ts(),
            ObjectId::from_content(b"snap"),
            vec![FileChange::new("a.css", ChangeStatus::Modified)],
        );

        let value = serde_json::to_value(&commit).unwrap();
        assert_eq!(value["parentId"], parent.to_hex());
        assert_eq!(value["timestamp"], "2025-01-01T12:00:00.000Z");
        assert_eq!(value["changes"][0]["status"], "modified");
        assert_eq!(commit.summary(), "style tweak");

        let back: Commit = serde_json::from_value(value).unwrap();
        assert_eq!(back, commit);
        assert!(back.verify_id());
    }

    #[test]
    fn test_commit_requires_parent_key() {
        let commit = Commit::new(None, "main", "alice", "Initial", ts(), ObjectId::default(), vec![]);
        let mut value = serde_json::to_value(&commit).unwrap();
        assert!(value["parentId"].is_null());
        value.as_object_mut().unwrap().remove("parentId");
        assert!(serde_json::from_value::<Commit>(value).is_err());
    }

    #[test]
    fn test_tampered_commit_fails_verification() {
        let mut commit = Commit::new(None, "main", "alice", "Initial", ts(), ObjectId::default(), vec![]);
        commit.message = "Something else".to_string();
        assert!(!commit.verify_id());
    }
}
