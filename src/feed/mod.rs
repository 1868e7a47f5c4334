use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::Instrument;

use crate::config::Settings;
use crate::pipeline::render::render_feed;
use crate::publish::{FeedPublisher, FsPublisher};
use crate::store::{connect_lazy, PgStore};
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;

pub mod types;

/// castfeed feed ls/render
#[derive(Args)]
pub struct FeedCmd {
    #[command(subcommand)]
    pub cmd: FeedSub,
}

#[derive(Subcommand)]
pub enum FeedSub {
    // list configured feeds
    Ls,
    // render one feed from the store (stdout by default; --publish writes it)
    Render {
        id: String,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

/// `ls` reads only the config; `render` needs the database.
pub async fn run(dsn: Option<&str>, settings: &Settings, args: FeedCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    match args.cmd {
        FeedSub::Ls => ls_feeds(settings)?,
        FeedSub::Render { id, publish } => render_one(&connect_lazy(dsn)?, settings, id, publish).await?,
    }
    Ok(())
}

fn ls_feeds(settings: &Settings) -> Result<()> {
    let log = telemetry::feed();
    let _s = log.span(&FeedPhase::List).entered();
    let feeds = types::feed_rows(settings);
    log.info(format!("📡 Feeds ({}):", feeds.len()));
    for row in &feeds {
        log.info(format!(
            "[{}] {} type={} keep={} lang={:?}",
            row.id, row.name, row.kind, row.keep, row.language
        ));
    }
    if telemetry::config::json_mode() {
        log.result(&types::FeedList { feeds })?;
    }
    Ok(())
}

async fn render_one(pool: &sqlx::PgPool, settings: &Settings, id: String, publish: bool) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("id", id.clone()), ("publish", publish.to_string())]).entered();

    let feed = settings
        .feeds
        .iter()
        .find(|f| f.id == id)
        .with_context(|| format!("unknown feed id: {id}"))?;
    let keep = settings.keep(feed);
    let store = PgStore::new(pool.clone());

    let document = render_feed(&store, feed, keep, &settings.root_url)
        .instrument(log.span(&FeedPhase::Render))
        .await?;
    let items = document.matches("<item>").count();
    if document.is_empty() {
        log.info(format!("🈳 nothing stored for {} ({})", feed.name, feed.id));
    }

    let mut result = types::FeedRenderResult { id: id.clone(), items, published: false, path: None, document: None };
    if publish && !document.is_empty() {
        let publisher = FsPublisher::new(settings.feeds_dir.clone());
        publisher
            .save(&feed.id, &document)
            .instrument(log.span(&FeedPhase::Publish))
            .await?;
        let path = publisher.path_for(&feed.id).display().to_string();
        log.info(format!("📤 published {} items to {}", items, path));
        result.published = true;
        result.path = Some(path);
    } else if !publish {
        if telemetry::config::json_mode() {
            result.document = Some(document);
        } else {
            print!("{document}");
        }
    }

    if telemetry::config::json_mode() {
        log.result(&result)?;
    }
    Ok(())
}
