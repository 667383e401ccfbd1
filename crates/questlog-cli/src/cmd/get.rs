//! `ql get` — full detail for one quest.

use crate::output::{OutputMode, fail, render};
use clap::Args;
use questlog_core::Config;
use questlog_core::ops;
use questlog_core::render as view;
use std::io::Write;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Quest id to show (e.g. quest-001).
    pub id: String,
}

pub fn run_get(
    args: &GetArgs,
    session: &str,
    output: OutputMode,
    cfg: &Config,
) -> anyhow::Result<()> {
    match ops::get(cfg, session, &args.id) {
        Ok(outcome) => render(output, &outcome, |o, w| {
            write!(w, "{}", view::quest_detail(&o.quest, &o.ledger))
        }),
        Err(err) => Err(fail(output, &err)),
    }
}
