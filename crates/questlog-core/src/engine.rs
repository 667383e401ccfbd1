//! Pure dependency logic over an in-memory [`Ledger`].
//!
//! Nothing here touches the filesystem; the store owns persistence and the
//! ops layer owns orchestration. Blocker ids that reference no existing
//! quest are inert everywhere: they never block and never fail an operation.

use crate::error::{BlockerRef, QuestError};
use crate::model::{Ledger, Quest, Status};
use serde::Serialize;

/// Next quest id: `max(existing numeric suffixes) + 1`, zero-padded.
///
/// Ids are never reused, so gaps are permanent: with `quest-005` as the only
/// quest, the next create yields `quest-006`.
#[must_use]
pub fn next_id(ledger: &Ledger) -> String {
    let max = ledger
        .quests
        .iter()
        .filter_map(|q| Quest::id_suffix(&q.id))
        .max()
        .unwrap_or(0);
    Quest::format_id(max + 1)
}

/// True iff the quest is `pending` and every blocker that resolves to an
/// existing quest is `completed`.
#[must_use]
pub fn is_eligible(quest: &Quest, ledger: &Ledger) -> bool {
    quest.status == Status::Pending && unresolved_blockers(quest, ledger).is_empty()
}

/// The existing, not-yet-completed blockers of a quest, in `blockedBy` order.
#[must_use]
pub fn unresolved_blockers(quest: &Quest, ledger: &Ledger) -> Vec<BlockerRef> {
    quest
        .blocked_by
        .iter()
        .filter_map(|id| ledger.find(id))
        .filter(|blocker| blocker.status != Status::Completed)
        .map(|blocker| BlockerRef {
            id: blocker.id.clone(),
            subject: blocker.subject.clone(),
            status: blocker.status,
        })
        .collect()
}

/// Result of a successful status change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusApplied {
    /// Quests that became eligible because this one completed. Informational:
    /// their own status stays `pending` until an explicit update.
    pub newly_unblocked: Vec<String>,
}

/// Apply a status change, enforcing the unresolved-blocker gate.
///
/// Advancing into `in_progress` or `completed` is rejected while any
/// existing blocker is incomplete; the rejection names every unresolved
/// blocker and mutates nothing. Lateral and backward moves are always
/// allowed. On success `updatedAt` is set to `now`, and completing a quest
/// reports the cascade of quests it unblocked.
pub fn attempt_status_change(
    ledger: &mut Ledger,
    id: &str,
    new_status: Status,
    now: &str,
) -> Result<StatusApplied, QuestError> {
    let Some(idx) = ledger.quests.iter().position(|q| q.id == id) else {
        return Err(QuestError::NotFound {
            id: id.to_string(),
            known: ledger.known_ids(),
        });
    };

    if new_status.is_advance() {
        let blockers = unresolved_blockers(&ledger.quests[idx], ledger);
        if !blockers.is_empty() {
            return Err(QuestError::Blocked {
                id: id.to_string(),
                blockers,
            });
        }
    }

    let quest = &mut ledger.quests[idx];
    quest.status = new_status;
    quest.updated_at = now.to_string();

    let newly_unblocked = if new_status == Status::Completed {
        newly_unblocked(ledger, id)
    } else {
        Vec::new()
    };

    Ok(StatusApplied { newly_unblocked })
}

/// Ids of `pending` quests that list `completed_id` as a blocker and are now
/// fully unblocked.
#[must_use]
pub fn newly_unblocked(ledger: &Ledger, completed_id: &str) -> Vec<String> {
    ledger
        .quests
        .iter()
        .filter(|q| {
            q.status == Status::Pending
                && q.blocked_by.iter().any(|b| b == completed_id)
                && is_eligible(q, ledger)
        })
        .map(|q| q.id.clone())
        .collect()
}

/// Append blockers to a quest. Only ids that are not already present and
/// reference an existing quest are added; the rest are silently ignored.
/// Returns the ids actually added. `updatedAt` is bumped whenever a
/// non-empty request was made, even if nothing survived the filter.
pub fn add_blockers(
    ledger: &mut Ledger,
    id: &str,
    blocker_ids: &[String],
    now: &str,
) -> Result<Vec<String>, QuestError> {
    let Some(idx) = ledger.quests.iter().position(|q| q.id == id) else {
        return Err(QuestError::NotFound {
            id: id.to_string(),
            known: ledger.known_ids(),
        });
    };

    let existing: Vec<String> = blocker_ids
        .iter()
        .filter(|b| ledger.find(b).is_some())
        .cloned()
        .collect();

    let quest = &mut ledger.quests[idx];
    let mut added = Vec::new();
    for blocker in existing {
        if !quest.blocked_by.contains(&blocker) {
            quest.blocked_by.push(blocker.clone());
            added.push(blocker);
        }
    }
    if !blocker_ids.is_empty() {
        quest.updated_at = now.to_string();
    }
    Ok(added)
}

/// Remove blockers from a quest unconditionally (no existence check).
/// Returns the ids actually removed.
pub fn remove_blockers(
    ledger: &mut Ledger,
    id: &str,
    blocker_ids: &[String],
    now: &str,
) -> Result<Vec<String>, QuestError> {
    let Some(idx) = ledger.quests.iter().position(|q| q.id == id) else {
        return Err(QuestError::NotFound {
            id: id.to_string(),
            known: ledger.known_ids(),
        });
    };

    let quest = &mut ledger.quests[idx];
    let mut removed = Vec::new();
    quest.blocked_by.retain(|b| {
        if blocker_ids.contains(b) {
            removed.push(b.clone());
            false
        } else {
            true
        }
    });
    if !blocker_ids.is_empty() {
        quest.updated_at = now.to_string();
    }
    Ok(removed)
}

/// Eligible quests in creation order.
#[must_use]
pub fn available(ledger: &Ledger) -> Vec<&Quest> {
    ledger
        .quests
        .iter()
        .filter(|q| is_eligible(q, ledger))
        .collect()
}

/// True iff the ledger is non-empty and every quest is `completed`.
#[must_use]
pub fn all_completed(ledger: &Ledger) -> bool {
    !ledger.quests.is_empty()
        && ledger.quests.iter().all(|q| q.status == Status::Completed)
}

/// Per-status counts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl Summary {
    #[must_use]
    pub fn of(ledger: &Ledger) -> Self {
        let mut summary = Self {
            total: ledger.quests.len(),
            ..Self::default()
        };
        for quest in &ledger.quests {
            match quest.status {
                Status::Pending => summary.pending += 1,
                Status::InProgress => summary.in_progress += 1,
                Status::Completed => summary.completed += 1,
            }
        }
        summary
    }
}
