use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::entry::Entry;
use crate::store::{EntryStore, PgStore};
use crate::telemetry::{self};
use crate::telemetry::ops::stats::Phase as StatsPhase;

/// castfeed stats: lifetime processed count and the newest stored entry
#[derive(Args, Debug)]
pub struct StatsCmd {}

#[derive(Serialize)]
struct StatsView {
    processed: usize,
    last: Option<Entry>,
}

pub async fn run(pool: &PgPool, _args: StatsCmd) -> Result<()> {
    let log = telemetry::stats();
    let _g = log.root_span().entered();
    let store = PgStore::new(pool.clone());

    let processed = {
        let _s = log.span(&StatsPhase::Count).entered();
        store.count_processed().await
    };
    log.info(format!("📊 Processed entries (lifetime): {processed}"));

    let last = {
        let _s = log.span(&StatsPhase::Last).entered();
        store.most_recent().await?
    };
    match &last {
        Some(e) => log.info(format!("🕘 Last entry: {e}")),
        None => log.info("🕘 No entries stored yet"),
    }

    if telemetry::config::json_mode() {
        log.result(&StatsView { processed, last })?;
    }
    Ok(())
}
