use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

static MIGRATOR: Migrator = sqlx::migrate!();

/// castfeed init: create the `castfeed` schema (plan-only unless --apply)
#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, default_value_t = false)]
    apply: bool,
}

#[derive(Serialize)]
struct InitPlan {
    migrations: Vec<String>,
}

#[derive(Serialize)]
struct InitResult {
    migrations: usize,
    tables: Vec<String>,
}

fn migration_names() -> Vec<String> {
    MIGRATOR.iter().map(|m| format!("{} {}", m.version, m.description)).collect()
}

pub async fn run(pool: &PgPool, args: InitCmd) -> Result<()> {
    let log = telemetry::init();
    let _g = log
        .root_span_kv([("mode", if args.apply { "apply".to_string() } else { "plan".to_string() })])
        .entered();

    let migrations = migration_names();
    if !args.apply {
        let _s = log.span(&InitPhase::Plan).entered();
        log.info(format!("📝 Init plan — {} migration(s):", migrations.len()));
        for m in &migrations {
            log.info(format!("   {m}"));
        }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&InitPlan { migrations })?;
        }
        return Ok(());
    }

    {
        let _s = log.span(&InitPhase::Migrate).entered();
        MIGRATOR.run(pool).await.context("failed to apply migrations")?;
    }

    let _s = log.span(&InitPhase::Verify).entered();
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = 'castfeed' ORDER BY table_name",
    )
    .fetch_all(pool)
    .await?;
    log.info(format!("✅ Database initialized — tables: {}", tables.join(", ")));
    if telemetry::config::json_mode() {
        log.result(&InitResult { migrations: migrations.len(), tables })?;
    }
    Ok(())
}
