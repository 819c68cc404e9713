// Integration test utilities and payload fixtures for Repograph.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use repograph_core::progress::ProgressReporter;
use repograph_core::types::{
    AttributeMap, AuthorEdge, Branch, BranchCommitEdge, Commit, Developer, FileEntity,
    FileMethodEdge, GraphPayload, Method, ParentEdge, UpdateFileEdge, UpdateMethodEdge,
};

pub const PROJECT: &str = "fixture-project";

/// Deterministic timestamps so fixtures compare stably across runs.
pub fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000 + offset_secs, 0)
        .single()
        .expect("fixture timestamp is valid")
}

pub fn dev(hash: &str, email: &str, name: &str) -> Developer {
    Developer {
        hash: hash.into(),
        email: email.into(),
        name: name.into(),
    }
}

pub fn commit(hash: &str, offset_secs: i64) -> Commit {
    Commit {
        hash: hash.into(),
        timestamp: ts(offset_secs),
        is_merge: false,
        project_id: PROJECT.into(),
    }
}

pub fn branch(hash: &str, name: &str) -> Branch {
    Branch {
        hash: hash.into(),
        name: name.into(),
        project_id: PROJECT.into(),
    }
}

pub fn file(hash: &str, name: &str) -> FileEntity {
    FileEntity {
        hash: hash.into(),
        project_id: PROJECT.into(),
        file_type: "rs".into(),
        name: name.into(),
    }
}

pub fn method(hash: &str, name: &str, file_name: &str) -> Method {
    Method {
        hash: hash.into(),
        project_id: PROJECT.into(),
        name: name.into(),
        file_name: file_name.into(),
    }
}

pub fn change_attrs(added: i64, removed: i64) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert("lines_added".into(), serde_json::Value::from(added));
    map.insert("lines_removed".into(), serde_json::Value::from(removed));
    map
}

/// A small but complete mining run: two developers, three commits on one
/// branch, two files, two methods, and every relationship kind.
pub fn small_payload() -> GraphPayload {
    GraphPayload {
        developers: vec![
            dev("d1", "ada@example.com", "Ada"),
            dev("d2", "grace@example.com", "Grace"),
        ],
        commits: vec![commit("c1", 0), commit("c2", 60), commit("c3", 120)],
        parents: vec![
            ParentEdge {
                parent_hash: "c1".into(),
                child_hash: "c2".into(),
            },
            ParentEdge {
                parent_hash: "c2".into(),
                child_hash: "c3".into(),
            },
        ],
        authors: vec![
            AuthorEdge {
                author_hash: "d1".into(),
                commit_hash: "c1".into(),
                timestamp: ts(0),
            },
            AuthorEdge {
                author_hash: "d1".into(),
                commit_hash: "c2".into(),
                timestamp: ts(60),
            },
            AuthorEdge {
                author_hash: "d2".into(),
                commit_hash: "c3".into(),
                timestamp: ts(120),
            },
        ],
        branches: vec![branch("b1", "main")],
        branch_commits: vec![
            BranchCommitEdge {
                branch_hash: "b1".into(),
                commit_hash: "c1".into(),
            },
            BranchCommitEdge {
                branch_hash: "b1".into(),
                commit_hash: "c2".into(),
            },
            BranchCommitEdge {
                branch_hash: "b1".into(),
                commit_hash: "c3".into(),
            },
        ],
        files: vec![file("f1", "src/lib.rs"), file("f2", "src/main.rs")],
        update_files: vec![
            UpdateFileEdge {
                commit_hash: "c1".into(),
                file_hash: "f1".into(),
                attributes: change_attrs(120, 0),
            },
            UpdateFileEdge {
                commit_hash: "c2".into(),
                file_hash: "f2".into(),
                attributes: change_attrs(40, 8),
            },
        ],
        methods: vec![
            method("m1", "parse", "src/lib.rs"),
            method("m2", "main", "src/main.rs"),
        ],
        file_methods: vec![
            FileMethodEdge {
                file_hash: "f1".into(),
                method_hash: "m1".into(),
            },
            FileMethodEdge {
                file_hash: "f2".into(),
                method_hash: "m2".into(),
            },
        ],
        update_methods: vec![UpdateMethodEdge {
            commit_hash: "c2".into(),
            method_hash: "m2".into(),
            attributes: change_attrs(12, 3),
        }],
    }
}

/// A payload of `n` commits and nothing else, for batching scenarios.
pub fn commits_only(n: usize) -> GraphPayload {
    GraphPayload {
        commits: (0..n)
            .map(|i| commit(&format!("c{i}"), i as i64))
            .collect(),
        ..Default::default()
    }
}

// ── Progress capture ───────────────────────────────────────────────

/// One observed reporter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { task: String, total: Option<u64> },
    Advance(u64),
    Finish,
    Message(String),
}

/// Reporter that records every call, for asserting batch submission
/// patterns in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("reporter mutex poisoned").clone()
    }

    /// The advance amounts recorded between a task's start and finish —
    /// one entry per submitted batch.
    pub fn advances_for(&self, task: &str) -> Vec<u64> {
        let events = self.events();
        let mut amounts = Vec::new();
        let mut in_task = false;
        for event in events {
            match event {
                ProgressEvent::Start { task: t, .. } => in_task = t == task,
                ProgressEvent::Advance(amount) if in_task => amounts.push(amount),
                ProgressEvent::Finish => {
                    if in_task {
                        break;
                    }
                }
                _ => {}
            }
        }
        amounts
    }
}

impl ProgressReporter for RecordingReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(ProgressEvent::Start {
                task: task.to_string(),
                total,
            });
    }

    fn advance(&self, amount: u64) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(ProgressEvent::Advance(amount));
    }

    fn finish(&self) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(ProgressEvent::Finish);
    }

    fn message(&self, msg: &str) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(ProgressEvent::Message(msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payload_is_internally_consistent() {
        let payload = small_payload();
        // Every edge endpoint names an entity present in the payload.
        let commit_hashes: Vec<&str> = payload.commits.iter().map(|c| c.hash.as_str()).collect();
        for edge in &payload.parents {
            assert!(commit_hashes.contains(&edge.parent_hash.as_str()));
            assert!(commit_hashes.contains(&edge.child_hash.as_str()));
        }
        for edge in &payload.authors {
            assert!(commit_hashes.contains(&edge.commit_hash.as_str()));
        }
    }

    #[test]
    fn recording_reporter_scopes_advances_to_task() {
        let reporter = RecordingReporter::new();
        reporter.start("Commit", Some(150));
        reporter.advance(100);
        reporter.advance(50);
        reporter.finish();
        reporter.start("Branch", Some(1));
        reporter.advance(1);
        reporter.finish();

        assert_eq!(reporter.advances_for("Commit"), vec![100, 50]);
        assert_eq!(reporter.advances_for("Branch"), vec![1]);
        assert!(reporter.advances_for("Method").is_empty());
    }
}
