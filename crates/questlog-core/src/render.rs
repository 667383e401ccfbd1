//! Pure rendering of ledger state into human-readable views.
//!
//! Everything here is a function of the ledger: no mutation, no I/O, and
//! none of it is needed for engine correctness.

use crate::engine::{Summary, unresolved_blockers};
use crate::model::{ID_PREFIX, Ledger, Quest, Status};

/// Shared width for detail-view separators.
pub const RULE_WIDTH: usize = 72;

/// Quests per line in the ultra-compact listing.
pub const COMPACT_GROUP: usize = 15;

/// One-character status marker.
#[must_use]
pub const fn status_glyph(status: Status) -> &'static str {
    match status {
        Status::Pending => "○",
        Status::InProgress => "▸",
        Status::Completed => "✓",
    }
}

/// Marker appended to quests with unresolved blockers.
pub const BLOCKED_GLYPH: &str = "⊘";

/// True when the quest declares blockers and at least one is unresolved.
#[must_use]
pub fn is_blocked(quest: &Quest, ledger: &Ledger) -> bool {
    !quest.blocked_by.is_empty() && !unresolved_blockers(quest, ledger).is_empty()
}

/// One line per quest: `✓ quest-001: subject`, with a blocked marker naming
/// the declared blockers when any is unresolved.
#[must_use]
pub fn quest_line(quest: &Quest, ledger: &Ledger) -> String {
    let glyph = status_glyph(quest.status);
    if is_blocked(quest, ledger) {
        format!(
            "{glyph} {}: {} {BLOCKED_GLYPH} [blocked by: {}]",
            quest.id,
            quest.subject,
            quest.blocked_by.join(", ")
        )
    } else {
        format!("{glyph} {}: {}", quest.id, quest.subject)
    }
}

/// Ultra-compact code for one quest: `✓001`, `▸002`, `○003⊘`.
#[must_use]
pub fn compact_code(quest: &Quest, ledger: &Ledger) -> String {
    let short = quest.id.strip_prefix(ID_PREFIX).unwrap_or(&quest.id);
    let lock = if is_blocked(quest, ledger) {
        BLOCKED_GLYPH
    } else {
        ""
    };
    format!("{}{short}{lock}", status_glyph(quest.status))
}

/// Compact codes batched into lines of [`COMPACT_GROUP`], ` | `-separated.
#[must_use]
pub fn compact_lines(quests: &[&Quest], ledger: &Ledger) -> Vec<String> {
    quests
        .chunks(COMPACT_GROUP)
        .map(|chunk| {
            chunk
                .iter()
                .map(|q| compact_code(q, ledger))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect()
}

/// Legend for the compact listing.
#[must_use]
pub const fn compact_legend() -> &'static str {
    "legend: ✓=completed ▸=in progress ○=pending ⊘=blocked"
}

/// Short per-status tally used in compact headers: `2✓ 1▸ 3○`.
#[must_use]
pub fn summary_compact(summary: Summary) -> String {
    format!(
        "{}✓ {}▸ {}○",
        summary.completed, summary.in_progress, summary.pending
    )
}

/// Full-sentence summary: `2 completed, 1 in progress, 3 pending (6 total)`.
#[must_use]
pub fn summary_line(summary: Summary) -> String {
    format!(
        "{} completed, {} in progress, {} pending ({} total)",
        summary.completed, summary.in_progress, summary.pending, summary.total
    )
}

/// Full detail view for one quest: header, fields, then the complete
/// description (the task brief).
#[must_use]
pub fn quest_detail(quest: &Quest, ledger: &Ledger) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}: {}\n",
        status_glyph(quest.status),
        quest.id,
        quest.subject
    ));
    out.push_str(&format!("{:-<RULE_WIDTH$}\n", ""));

    let status = if is_blocked(quest, ledger) {
        format!("{} ({BLOCKED_GLYPH} blocked)", quest.status)
    } else {
        quest.status.to_string()
    };
    out.push_str(&kv("Status", &status));
    if let Some(active) = &quest.active_form {
        out.push_str(&kv("Doing", active));
    }
    if !quest.blocked_by.is_empty() {
        out.push_str(&kv("Blocked by", &quest.blocked_by.join(", ")));
    }
    out.push_str(&kv("Created", &quest.created_at));
    out.push_str(&kv("Updated", &quest.updated_at));
    out.push_str(&format!("{:-<RULE_WIDTH$}\n", ""));
    out.push_str(&quest.description);
    out.push('\n');
    out
}

fn kv(key: &str, value: &str) -> String {
    format!("{:<12} {value}\n", format!("{key}:"))
}
