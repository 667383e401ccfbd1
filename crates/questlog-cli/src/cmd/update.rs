//! `ql update` — patch one or more fields on a quest.
//!
//! Status is applied first and gated by unresolved blockers: a rejected
//! advance leaves the whole update unapplied. Completing a quest reports the
//! cascade of quests that became eligible; moving one to `in_progress`
//! prints the full task brief for the assignee.

use crate::output::{CliError, OutputMode, fail, render, render_error};
use clap::Args;
use questlog_core::ops::{self, UpdateOutcome, UpdateRequest};
use questlog_core::{Config, Status};
use std::io::Write;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Quest id to update (e.g. quest-001).
    pub id: String,

    /// New status: pending, in_progress, or completed.
    #[arg(long)]
    pub status: Option<String>,

    /// New title.
    #[arg(long)]
    pub subject: Option<String>,

    /// New task brief (replaces the previous description in full).
    #[arg(long)]
    pub description: Option<String>,

    /// New in-progress display label.
    #[arg(long)]
    pub active_form: Option<String>,

    /// Quest ids to add as blockers (repeatable).
    #[arg(long = "blocked-by", value_name = "ID")]
    pub blocked_by: Vec<String>,

    /// Quest ids to remove from the blocker set (repeatable).
    #[arg(long = "unblock", value_name = "ID")]
    pub unblock: Vec<String>,
}

pub fn run_update(
    args: &UpdateArgs,
    session: &str,
    output: OutputMode,
    cfg: &Config,
) -> anyhow::Result<()> {
    let status = match args.status.as_deref().map(Status::from_str).transpose() {
        Ok(status) => status,
        Err(err) => {
            render_error(
                output,
                &CliError::with_details(
                    err.to_string(),
                    "Use one of: pending, in_progress, completed",
                    "invalid_status",
                ),
            )?;
            anyhow::bail!("{err}");
        }
    };

    let request = UpdateRequest {
        id: args.id.clone(),
        status,
        subject: args.subject.clone(),
        description: args.description.clone(),
        active_form: args.active_form.clone(),
        add_blocked_by: args.blocked_by.clone(),
        remove_blocked_by: args.unblock.clone(),
    };

    match ops::update(cfg, session, request) {
        Ok(outcome) => render(output, &outcome, render_update_human),
        Err(err) => Err(fail(output, &err)),
    }
}

fn render_update_human(outcome: &UpdateOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "✓ {} updated", outcome.quest.id)?;
    for change in &outcome.changes {
        writeln!(w, "  • {change}")?;
    }

    if outcome.started {
        render_brief(outcome, w)?;
    }

    if !outcome.newly_unblocked.is_empty() {
        writeln!(w, "unblocked: {}", outcome.newly_unblocked.join(", "))?;
    }

    if outcome.all_completed {
        writeln!(w, "✓ all quests completed")?;
    }

    Ok(())
}

/// The handover block an assignee agent needs when a quest starts: the full
/// brief travels in the quest itself, never in conversation history.
fn render_brief(outcome: &UpdateOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    let quest = &outcome.quest;
    writeln!(w, "{:-<72}", "")?;
    writeln!(w, "Task brief: {}", quest.subject)?;
    if let Some(active) = &quest.active_form {
        writeln!(w, "Doing:      {active}")?;
    }
    if !quest.blocked_by.is_empty() {
        writeln!(w, "Depends on: {} (all resolved)", quest.blocked_by.join(", "))?;
    }
    writeln!(w, "{:-<72}", "")?;
    writeln!(w, "{}", quest.description)
}
