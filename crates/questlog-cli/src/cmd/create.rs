//! `ql create` — create a new quest.

use crate::output::{OutputMode, fail, render};
use clap::Args;
use questlog_core::Config;
use questlog_core::ops::{self, CreateRequest};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short, actionable title.
    #[arg(short, long)]
    pub subject: String,

    /// Complete task brief. Assignee agents see only this text, never the
    /// conversation, so include files, criteria, and context in full.
    #[arg(short, long)]
    pub description: String,

    /// Present-participle label for in-progress display ("Implementing login").
    #[arg(long)]
    pub active_form: Option<String>,
}

pub fn run_create(
    args: &CreateArgs,
    session: &str,
    output: OutputMode,
    cfg: &Config,
) -> anyhow::Result<()> {
    let request = CreateRequest {
        subject: args.subject.clone(),
        description: args.description.clone(),
        active_form: args.active_form.clone(),
    };

    match ops::create(cfg, session, request) {
        Ok(outcome) => render(output, &outcome, |o, w| {
            writeln!(w, "✓ created {}: {}", o.quest.id, o.quest.subject)?;
            if let Some(active) = &o.quest.active_form {
                writeln!(w, "  doing:  {active}")?;
            }
            writeln!(w, "  status: {}", o.quest.status)?;
            writeln!(
                w,
                "wire dependencies with `ql update {} --blocked-by <id>`",
                o.quest.id
            )
        }),
        Err(err) => Err(fail(output, &err)),
    }
}
