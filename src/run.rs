use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::download::CommandDownloader;
use crate::pipeline::Service;
use crate::publish::FsPublisher;
use crate::scheduler::Scheduler;
use crate::source::CommandLister;
use crate::store::PgStore;
use crate::telemetry::{self};

/// castfeed run: poll every feed on the configured interval until Ctrl-C
#[derive(Args, Debug)]
pub struct RunCmd {
    /// Run a single pass and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

/// Wire the shell-command adapters, the Postgres store and the filesystem
/// publisher into a Service.
pub fn build_service(settings: &Settings, pool: PgPool) -> Service {
    Service {
        feeds: settings.feeds.clone(),
        lister: Arc::new(CommandLister::new(settings.list_cmd.clone())),
        downloader: Arc::new(CommandDownloader::new(settings.download_cmd.clone(), settings.files_dir.clone())),
        store: Arc::new(PgStore::new(pool)),
        publisher: Arc::new(FsPublisher::new(settings.feeds_dir.clone())),
        keep_per_channel: settings.keep,
        root_url: settings.root_url.clone(),
    }
}

pub async fn run(pool: &PgPool, settings: &Settings, args: RunCmd) -> Result<()> {
    let log = telemetry::poll();
    let _g = log
        .root_span_kv([
            ("once", args.once.to_string()),
            ("feeds", settings.feeds.len().to_string()),
            ("interval", format!("{:?}", settings.interval)),
            ("keep", settings.keep.to_string()),
        ])
        .entered();

    if settings.feeds.is_empty() {
        log.warn("no feeds configured");
    }
    let service = build_service(settings, pool.clone());
    service.log_feeds();

    let scheduler = Scheduler::new(settings.interval);
    if args.once {
        let started = Instant::now();
        let stats = scheduler.run_once(&service).await?;
        if telemetry::config::json_mode() {
            log.result_timed(&stats, started)?;
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let stopped = scheduler.run_until_cancelled(&service, cancel).await?;
    log.info(format!("🛑 {stopped}, shutting down"));
    Ok(())
}
