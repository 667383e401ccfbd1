//! The operation API: the four verbs every agent process calls.
//!
//! Each verb takes the caller's session id explicitly, resolves the root of
//! its hierarchy first, and only then touches the ledger. Mutating verbs run
//! their load-modify-save inside the per-ledger lock; read-only verbs load
//! without locking.

use crate::config::Config;
use crate::engine::{self, Summary};
use crate::error::QuestError;
use crate::model::{Ledger, Quest, Status};
use crate::session;
use crate::store;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Current time in the ledger's timestamp format (ISO-8601 UTC, millisecond
/// precision, `Z` suffix).
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fields for the create verb.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub subject: String,
    pub description: String,
    pub active_form: Option<String>,
}

/// A created quest, plus the root the caller was resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub root_id: String,
    pub quest: Quest,
}

/// Create a new quest. Always starts `pending` with no blockers.
pub fn create(
    cfg: &Config,
    session_id: &str,
    req: CreateRequest,
) -> Result<CreateOutcome, QuestError> {
    if req.subject.trim().is_empty() {
        return Err(QuestError::MissingField { field: "subject" });
    }
    if req.description.trim().is_empty() {
        return Err(QuestError::MissingField { field: "description" });
    }

    let root_id = session::resolve_root(cfg, session_id);
    let quest = store::mutate(cfg, &root_id, |ledger| {
        let now = now_iso();
        let quest = Quest {
            id: engine::next_id(ledger),
            subject: req.subject,
            description: req.description,
            status: Status::Pending,
            active_form: non_blank(req.active_form),
            blocked_by: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        ledger.quests.push(quest.clone());
        Ok(quest)
    })?;

    info!(%root_id, id = %quest.id, "quest created");
    Ok(CreateOutcome { root_id, quest })
}

/// Fields for the update verb. Everything is optional; blank strings count
/// as absent. An update that carries nothing recognized is rejected.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub id: String,
    pub status: Option<Status>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub active_form: Option<String>,
    pub add_blocked_by: Vec<String>,
    pub remove_blocked_by: Vec<String>,
}

/// What an update did, with everything the caller needs to act next.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub root_id: String,
    /// Snapshot of the quest after the update.
    pub quest: Quest,
    /// Human-readable change list, one entry per applied field.
    pub changes: Vec<String>,
    /// True when this update moved the quest into `in_progress`: the caller
    /// should be handed the full task brief.
    pub started: bool,
    /// Quests that became eligible because this one completed.
    pub newly_unblocked: Vec<String>,
    /// True when every quest in the ledger is now completed.
    pub all_completed: bool,
}

/// Update a quest: status (gated by blockers), subject, description,
/// activeForm, and blocker-set edits, in that order. A blocked status
/// advance rejects the whole update; nothing is applied.
pub fn update(
    cfg: &Config,
    session_id: &str,
    req: UpdateRequest,
) -> Result<UpdateOutcome, QuestError> {
    let root_id = session::resolve_root(cfg, session_id);
    let id = req.id.clone();

    let outcome = store::mutate(cfg, &root_id, move |ledger| {
        let now = now_iso();
        let Some(idx) = ledger.quests.iter().position(|q| q.id == req.id) else {
            return Err(QuestError::NotFound {
                id: req.id,
                known: ledger.known_ids(),
            });
        };
        let current = ledger.quests[idx].status;

        let mut changes = Vec::new();
        let mut started = false;
        let mut newly_unblocked = Vec::new();

        // Status first: a blocked advance must reject the update before any
        // other field is touched.
        if let Some(status) = req.status.filter(|s| *s != current) {
            let applied = engine::attempt_status_change(ledger, &req.id, status, &now)?;
            newly_unblocked = applied.newly_unblocked;
            started = status == Status::InProgress;
            changes.push(format!("status → {status}"));
        }

        if let Some(subject) = non_blank(req.subject) {
            if ledger.quests[idx].subject != subject {
                ledger.quests[idx].subject = subject;
                changes.push("subject updated".to_string());
            }
        }

        if let Some(description) = non_blank(req.description) {
            ledger.quests[idx].description = description;
            changes.push("description updated".to_string());
        }

        if let Some(active_form) = non_blank(req.active_form) {
            changes.push(format!("activeForm → {active_form}"));
            ledger.quests[idx].active_form = Some(active_form);
        }

        if !req.add_blocked_by.is_empty() {
            engine::add_blockers(ledger, &req.id, &req.add_blocked_by, &now)?;
            changes.push(format!("blockedBy += [{}]", req.add_blocked_by.join(", ")));
        }

        if !req.remove_blocked_by.is_empty() {
            engine::remove_blockers(ledger, &req.id, &req.remove_blocked_by, &now)?;
            changes.push(format!(
                "blockedBy -= [{}]",
                req.remove_blocked_by.join(", ")
            ));
        }

        if changes.is_empty() {
            return Err(QuestError::EmptyUpdate { id: req.id });
        }

        ledger.quests[idx].updated_at = now;
        let quest = ledger.quests[idx].clone();
        let all_completed = engine::all_completed(ledger);

        Ok(UpdateOutcome {
            root_id: String::new(),
            quest,
            changes,
            started,
            newly_unblocked,
            all_completed,
        })
    })?;

    info!(%root_id, %id, changes = outcome.changes.len(), "quest updated");
    Ok(UpdateOutcome { root_id, ..outcome })
}

/// Fields for the list verb.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListRequest {
    /// Only quests that are eligible to start right now.
    pub available: bool,
    /// Ultra-compact rendering for large ledgers.
    pub compact: bool,
}

/// A filtered view of the ledger, plus context for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ListOutcome {
    pub root_id: String,
    /// Set when the caller is a descendant seeing its root's ledger.
    pub shared_root: Option<String>,
    /// Ids in the requested view, creation order.
    pub view_ids: Vec<String>,
    pub summary: Summary,
    pub available: bool,
    pub compact: bool,
    /// The full ledger the view was computed from.
    pub ledger: Ledger,
}

/// List quests, whole ledger or available-only. Read-only; no lock.
#[must_use]
pub fn list(cfg: &Config, session_id: &str, req: ListRequest) -> ListOutcome {
    let root_id = session::resolve_root(cfg, session_id);
    let ledger = store::load(cfg, &root_id);
    debug!(%root_id, quests = ledger.quests.len(), "ledger listed");

    let view_ids = if req.available {
        engine::available(&ledger)
            .into_iter()
            .map(|q| q.id.clone())
            .collect()
    } else {
        ledger.known_ids()
    };

    ListOutcome {
        shared_root: (session_id != root_id).then(|| root_id.clone()),
        root_id,
        view_ids,
        summary: Summary::of(&ledger),
        available: req.available,
        compact: req.compact,
        ledger,
    }
}

/// One quest with the ledger context needed to render it.
#[derive(Debug, Clone, Serialize)]
pub struct GetOutcome {
    pub root_id: String,
    pub quest: Quest,
    pub ledger: Ledger,
}

/// Fetch one quest's full detail. Read-only; no lock.
pub fn get(cfg: &Config, session_id: &str, id: &str) -> Result<GetOutcome, QuestError> {
    let root_id = session::resolve_root(cfg, session_id);
    let ledger = store::load(cfg, &root_id);

    let Some(quest) = ledger.find(id).cloned() else {
        return Err(QuestError::NotFound {
            id: id.to_string(),
            known: ledger.known_ids(),
        });
    };

    Ok(GetOutcome {
        root_id,
        quest,
        ledger,
    })
}
