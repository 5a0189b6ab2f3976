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

//! Integration tests for the theme repository

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use themevc_core::{
    ChangeStatus, Commit, CommitId, EngineConfig, FsContentProvider, MemoryContentProvider,
    Snapshot, SteppingClock, ThemeRepository, VcsError, MAIN_BRANCH,
};

fn seeded(files: &[(&str, &str)]) -> ThemeRepository {
    ThemeRepository::with_clock(
        Snapshot::from_pairs(files.iter().copied()),
        EngineConfig::default(),
        Arc::new(SteppingClock::from_epoch()),
    )
}

fn ids(commits: &[Arc<Commit>]) -> Vec<CommitId> {
    commits.iter().map(|c| c.id).collect()
}

/// Fingerprint of every commit in every branch's history
fn fingerprint(repo: &ThemeRepository) -> HashMap<CommitId, Commit> {
    repo.branches()
        .iter()
        .flat_map(|b| repo.history(Some(b.name.as_str())).unwrap())
        .map(|c| (c.id, Commit::clone(&c)))
        .collect()
}

/// Stage, commit, then roll back to the root
#[test]
fn test_style_tweak_scenario() {
    let repo = seeded(&[("a.css", "body{}")]);
    let root = repo.head().unwrap();

    let status = repo.stage("a.css", Some("body{color:red}")).unwrap();
    assert_eq!(status, Some(ChangeStatus::Modified));

    let c1 = repo.commit("style tweak", "alice").unwrap();
    assert_eq!(c1.changes.len(), 1);
    assert_eq!(c1.changes[0].path, "a.css");
    assert_eq!(c1.changes[0].status, ChangeStatus::Modified);
    assert_eq!(c1.parent_id, Some(root.id));
    assert_eq!(ids(&repo.history(None).unwrap()), vec![c1.id, root.id]);

    let c2 = repo.rollback(&root.id.to_hex()).unwrap();
    assert_eq!(c2.author, "system");
    assert_eq!(c2.message, format!("Rollback to {}", root.short_id()));
    assert_eq!(c2.snapshot_id, root.snapshot_id);
    assert_eq!(repo.read_file("a.css").unwrap().as_deref(), Some("body{}"));
    assert_eq!(ids(&repo.history(None).unwrap()), vec![c2.id, c1.id, root.id]);
}

/// Existing commits never change under later operations
#[test]
fn test_commits_are_immutable() {
    let repo = seeded(&[("a.css", "body{}"), ("b.js", "let a;")]);
    repo.stage("a.css", Some("body{margin:0}")).unwrap();
    repo.commit("margin", "alice").unwrap();
    let before = fingerprint(&repo);

    repo.stage("b.js", None).unwrap();
    repo.commit("drop script", "bob").unwrap();
    let root = repo.history(None).unwrap().last().cloned().unwrap();
    repo.rollback(&root.short_id()).unwrap();
    repo.import(&repo.export().unwrap()).unwrap();

    let after = fingerprint(&repo);
    for (id, commit) in before {
        assert_eq!(after.get(&id), Some(&commit));
    }
}

/// Rollback appends and never shrinks history
#[test]
fn test_rollback_is_append_only() {
    let repo = seeded(&[("a.css", "0")]);
    for i in 1..=3 {
        repo.stage("a.css", Some(i.to_string().as_str())).unwrap();
        repo.commit(&format!("edit {}", i), "alice").unwrap();
    }

    let history = repo.history(None).unwrap();
    let prior_head = history[0].id;
    let target = history[2].clone();
    let total = repo.stats().total_commits;

    repo.stage("a.css", Some("uncommitted")).unwrap();
    repo.rollback(&target.short_id()).unwrap();

    assert_eq!(repo.stats().total_commits, total + 1);
    assert_eq!(repo.stats().staged_changes, 0);
    assert!(ids(&repo.history(None).unwrap()).contains(&prior_head));
    assert_eq!(repo.read_file("a.css").unwrap().as_deref(), Some("1"));
}

/// Staging HEAD content leaves nothing staged
#[test]
fn test_staging_head_content_is_noop() {
    let repo = seeded(&[("a.css", "body{}")]);
    assert_eq!(repo.stage("a.css", Some("body{}")).unwrap(), None);
    assert!(repo.list_staged().is_empty());
    assert!(matches!(repo.commit("nothing", "alice"), Err(VcsError::EmptyCommit)));
}

/// A failed commit leaves HEAD and branches where they were
#[test]
fn test_failed_commit_is_atomic() {
    let repo = seeded(&[("a.css", "body{}")]);
    repo.create_branch("feature").unwrap();
    let head = repo.head().unwrap();
    let branches = repo.branches();

    repo.stage("a.css", Some("changed")).unwrap();
    assert!(repo.commit("", "alice").is_err());

    assert_eq!(repo.head().unwrap().id, head.id);
    assert_eq!(repo.branches(), branches);
    assert_eq!(repo.list_staged().len(), 1);
}

/// Committing with nothing staged fails and leaves HEAD and branches untouched
#[test]
fn test_empty_staging_commit_is_atomic() {
    let repo = seeded(&[("a.css", "body{}")]);
    repo.stage("a.css", Some("body{color:red}")).unwrap();
    repo.commit("red", "alice").unwrap();
    repo.create_branch("feature").unwrap();

    let head = repo.head().unwrap();
    let branches = repo.branches();
    let before = fingerprint(&repo);

    assert_eq!(repo.commit("msg", "alice"), Err(VcsError::EmptyCommit));

    // Staging an edit and reverting it leaves staging empty again
    repo.stage("a.css", Some("body{}")).unwrap();
    repo.stage("a.css", Some("body{color:red}")).unwrap();
    assert!(repo.list_staged().is_empty());
    assert_eq!(repo.commit("msg", "alice"), Err(VcsError::EmptyCommit));

    assert_eq!(repo.head().unwrap().id, head.id);
    assert_eq!(repo.branches(), branches);
    assert_eq!(fingerprint(&repo), before);
    assert_eq!(repo.current_branch(), MAIN_BRANCH);
}

/// Export then import reproduces every branch's history and snapshot
#[test]
fn test_export_import_roundtrip() {
    let repo = seeded(&[("a.css", "body{}"), ("layout.html", "<main></main>\n")]);
    repo.stage("a.css", Some("body{color:red}")).unwrap();
    repo.commit("red", "alice").unwrap();
    repo.create_branch("experiment").unwrap();
    repo.checkout_branch("experiment").unwrap();
    repo.stage("layout.html", None).unwrap();
    repo.stage("new.css", Some("p{}")).unwrap();
    repo.commit("restructure", "bob").unwrap();

    let exported = repo.export().unwrap();
    assert_eq!(exported, repo.export().unwrap());

    let restored = ThemeRepository::from_history(
        &exported,
        EngineConfig::default(),
        Arc::new(SteppingClock::from_epoch()),
    )
    .unwrap();

    for branch in repo.branches() {
        let original = repo.history(Some(branch.name.as_str())).unwrap();
        assert_eq!(restored.history(Some(branch.name.as_str())).unwrap(), original);
        for commit in &original {
            let id = commit.id.to_hex();
            assert_eq!(restored.snapshot_at(&id).unwrap(), repo.snapshot_at(&id).unwrap());
        }
    }
    assert_eq!(restored.export().unwrap(), exported);
    assert_eq!(restored.current_branch(), MAIN_BRANCH);
}

/// Import keeps the current branch when it survives and clears staging
#[test]
fn test_import_replaces_state() {
    let source = seeded(&[("a.css", "body{}")]);
    source.create_branch("feature").unwrap();
    source.stage("a.css", Some("x")).unwrap();
    source.commit("x", "alice").unwrap();
    let doc = source.export().unwrap();

    let target = seeded(&[("other.css", "p{}")]);
    target.create_branch("feature").unwrap();
    target.checkout_branch("feature").unwrap();
    target.stage("other.css", Some("changed")).unwrap();

    target.import(&doc).unwrap();
    assert_eq!(target.current_branch(), "feature");
    assert!(target.list_staged().is_empty());
    assert_eq!(target.stats().total_commits, 2);
    assert_eq!(target.read_file("a.css").unwrap().as_deref(), Some("body{}"));

    let lone = seeded(&[("z.css", "")]);
    lone.create_branch("solo").unwrap();
    lone.checkout_branch("solo").unwrap();
    lone.import(&doc).unwrap();
    assert_eq!(lone.current_branch(), MAIN_BRANCH);
}

/// A rejected import leaves the repository untouched
#[test]
fn test_failed_import_is_atomic() {
    let repo = seeded(&[("a.css", "body{}")]);
    repo.stage("a.css", Some("pending")).unwrap();
    let before = repo.export().unwrap();

    assert!(matches!(repo.import("{\"branches\": []}"), Err(VcsError::Schema(_))));

    let mut doc: serde_json::Value = serde_json::from_str(&before).unwrap();
    doc["commits"][0]["author"] = "mallory".into();
    assert!(matches!(repo.import(&doc.to_string()), Err(VcsError::Integrity(_))));

    assert_eq!(repo.export().unwrap(), before);
    assert_eq!(repo.list_staged().len(), 1);
}

/// Commit ids resolve by unique prefix
#[test]
fn test_show_by_prefix() {
    let repo = seeded(&[("a.css", "body{}")]);
    let root = repo.head().unwrap();
    assert_eq!(repo.show(&root.short_id()).unwrap().id, root.id);
    assert_eq!(repo.show(&root.id.to_hex().to_uppercase()).unwrap().id, root.id);
    assert!(matches!(repo.show("0000000"), Err(VcsError::UnknownCommit(_))));
}

/// Log truncates history
#[test]
fn test_log_limit() {
    let repo = seeded(&[("a.css", "0")]);
    for i in 1..=5 {
        repo.stage("a.css", Some(i.to_string().as_str())).unwrap();
        repo.commit("edit", "alice").unwrap();
    }
    assert_eq!(repo.log(None, Some(2)).unwrap().len(), 2);
    assert_eq!(repo.log(None, None).unwrap().len(), 6);
    assert!(matches!(repo.log(Some("nope"), None), Err(VcsError::UnknownBranch(_))));
}

/// Seed from a theme directory on disk
#[test]
fn test_seed_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();
    std::fs::write(dir.path().join("templates/product.html"), "<h1>{{ title }}</h1>").unwrap();
    std::fs::write(dir.path().join("theme.css"), "body{}").unwrap();

    let provider = FsContentProvider::new(dir.path());
    let repo = ThemeRepository::from_provider(&provider, EngineConfig::default()).unwrap();

    let root = repo.head().unwrap();
    let paths: Vec<_> = root.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["templates/product.html", "theme.css"]);

    let memory = MemoryContentProvider::new().with_file("theme.css", "body{}");
    let from_memory = ThemeRepository::from_provider(&memory, EngineConfig::default()).unwrap();
    assert_eq!(from_memory.stats().total_commits, 1);
}

/// Readers see consistent state while another thread commits
#[test]
fn test_concurrent_readers_and_writer() {
    let repo = Arc::new(seeded(&[("a.css", "0")]));

    let writer = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for i in 1..=20 {
                repo.stage("a.css", Some(i.to_string().as_str())).unwrap();
                repo.commit(&format!("edit {}", i), "writer").unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for _ in 0..50 {
                    let history = repo.history(None).unwrap();
                    assert!(history.last().unwrap().is_root());
                    let stats = repo.stats();
                    assert!(stats.total_commits >= 1);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(repo.history(None).unwrap().len(), 21);
}

/// Custom config flows into engine-generated commits
#[test]
fn test_config_system_author() {
    let config = EngineConfig::from_toml(
        "[repository]\nsystem_author = \"theme-bot\"\ninitial_message = \"Imported theme\"\n",
    )
    .unwrap();
    let repo = ThemeRepository::with_clock(
        Snapshot::from_pairs([("a.css", "body{}")]),
        config,
        Arc::new(SteppingClock::from_epoch()),
    );

    let root = repo.head().unwrap();
    assert_eq!(root.author, "theme-bot");
    assert_eq!(root.message, "Imported theme");
    assert_eq!(repo.rollback(&root.short_id()).unwrap().author, "theme-bot");
}
