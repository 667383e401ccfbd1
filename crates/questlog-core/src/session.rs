use crate::config::Config;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One session record in the host runtime's metadata tree.
///
/// The host owns this format; extra fields are ignored and both `parentID`
/// and `parentId` spellings are accepted. An empty parent id means "root".
#[derive(Debug, Clone, Deserialize)]
struct SessionRecord {
    id: String,
    #[serde(default, alias = "parentID", alias = "parent_id")]
    parent_id: Option<String>,
}

impl SessionRecord {
    fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// Resolve the root session id for `session_id` so that every process in one
/// hierarchy shares the same ledger.
///
/// Follows the parent chain inside the starting session's project only
/// (cross-project ids are never followed), guards against cycles in
/// corrupted metadata, and degrades gracefully: any lookup failure makes the
/// last known id the root. Never fails.
#[must_use]
pub fn resolve_root(cfg: &Config, session_id: &str) -> String {
    let Some(project) = find_project(&cfg.session_root, session_id) else {
        debug!(session_id, "session project not found; using caller as root");
        return session_id.to_string();
    };

    let mut current = session_id.to_string();
    let mut visited: HashSet<String> = HashSet::new();

    loop {
        if !visited.insert(current.clone()) {
            debug!(session_id, cycle_at = %current, "cycle in session ancestry; stopping");
            break;
        }

        let Some(record) = read_record(&cfg.session_root, &project, &current) else {
            break;
        };

        match record.parent() {
            None => return record.id,
            Some(parent) => current = parent.to_string(),
        }
    }

    current
}

/// Find which project directory contains `<session_id>.json`.
fn find_project(session_root: &Path, session_id: &str) -> Option<String> {
    let entries = fs::read_dir(session_root).ok()?;
    let file_name = format!("{session_id}.json");

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && path.join(&file_name).exists() {
            return entry.file_name().into_string().ok();
        }
    }
    None
}

fn record_path(session_root: &Path, project: &str, session_id: &str) -> PathBuf {
    session_root.join(project).join(format!("{session_id}.json"))
}

/// Read one session record from the starting project. Any failure (missing
/// file, unreadable, malformed JSON) yields `None` and ends the walk.
fn read_record(session_root: &Path, project: &str, session_id: &str) -> Option<SessionRecord> {
    let path = record_path(session_root, project, session_id);
    let raw = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(err) => {
            debug!(path = %path.display(), %err, "unreadable session record; stopping walk");
            None
        }
    }
}
