//! `ql list` — list the shared ledger.

use crate::output::{OutputMode, render};
use clap::Args;
use questlog_core::Config;
use questlog_core::ops::{self, ListOutcome, ListRequest};
use questlog_core::render as view;
use std::io::Write;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only quests eligible to start (pending with all blockers completed).
    #[arg(long)]
    pub available: bool,

    /// Ultra-compact codes, 15 per line. Useful past ~20 quests.
    #[arg(long)]
    pub compact: bool,
}

pub fn run_list(
    args: &ListArgs,
    session: &str,
    output: OutputMode,
    cfg: &Config,
) -> anyhow::Result<()> {
    let outcome = ops::list(
        cfg,
        session,
        ListRequest {
            available: args.available,
            compact: args.compact,
        },
    );

    render(output, &outcome, render_list_human)
}

fn render_list_human(outcome: &ListOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    if outcome.ledger.quests.is_empty() {
        shared_note(outcome, w)?;
        writeln!(w, "no quests yet")?;
        writeln!(
            w,
            "create one with `ql create --subject <title> --description <brief>`"
        )?;
        return Ok(());
    }

    if outcome.available && outcome.view_ids.is_empty() {
        shared_note(outcome, w)?;
        writeln!(w, "no quests available right now")?;
        writeln!(w, "{}", view::summary_line(outcome.summary))?;
        writeln!(w, "run `ql list` to see what is blocked or in progress")?;
        return Ok(());
    }

    let quests: Vec<_> = outcome
        .view_ids
        .iter()
        .filter_map(|id| outcome.ledger.find(id))
        .collect();

    if outcome.compact {
        shared_note(outcome, w)?;
        writeln!(w, "quests {}", view::summary_compact(outcome.summary))?;
        for line in view::compact_lines(&quests, &outcome.ledger) {
            writeln!(w, "{line}")?;
        }
        writeln!(w, "{}", view::compact_legend())?;
        return Ok(());
    }

    shared_note(outcome, w)?;
    if outcome.available {
        writeln!(
            w,
            "available quests ({} of {})",
            quests.len(),
            outcome.summary.total
        )?;
    } else {
        writeln!(w, "quests ({})", outcome.summary.total)?;
    }
    for quest in &quests {
        writeln!(w, "{}", view::quest_line(quest, &outcome.ledger))?;
    }
    if !outcome.available {
        writeln!(w, "{}", view::summary_line(outcome.summary))?;
    }
    Ok(())
}

/// Descendants see their root's ledger; say so.
fn shared_note(outcome: &ListOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    if let Some(root) = &outcome.shared_root {
        writeln!(w, "(shared ledger, root {root})")?;
    }
    Ok(())
}
