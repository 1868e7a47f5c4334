use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::entry::{Author, Entry};

use super::{EntryStore, Pruned};

#[derive(FromRow)]
struct EntryRow {
    channel_id: String,
    video_id: String,
    title: String,
    published_at: DateTime<Utc>,
    author_name: String,
    author_uri: String,
    link: String,
    description: String,
    file: String,
}

impl From<EntryRow> for Entry {
    fn from(r: EntryRow) -> Self {
        Entry {
            channel_id: r.channel_id,
            video_id: r.video_id,
            title: r.title,
            published: r.published_at,
            author: Author { name: r.author_name, uri: r.author_uri },
            link: r.link,
            description: r.description,
            file: r.file,
        }
    }
}

const ENTRY_COLUMNS: &str =
    "channel_id, video_id, title, published_at, author_name, author_uri, link, description, file";

/// Pool for `--dsn`/`DATABASE_URL`. Connections open on first use.
pub fn connect_lazy(dsn: Option<&str>) -> Result<PgPool> {
    let dsn = dsn.context("please provide --dsn or set DATABASE_URL in .env")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(dsn)
        .context("invalid database url")
}

/// Postgres-backed store (schema `castfeed`, see `migrations/`).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgStore {
    async fn save(&self, entry: &Entry) -> Result<bool> {
        let exec = sqlx::query(
            r#"
            INSERT INTO castfeed.entry (channel_id, video_id, title, published_at,
                author_name, author_uri, link, description, file)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (channel_id, video_id) DO NOTHING
            "#,
        )
        .bind(&entry.channel_id)
        .bind(&entry.video_id)
        .bind(&entry.title)
        .bind(entry.published)
        .bind(&entry.author.name)
        .bind(&entry.author.uri)
        .bind(&entry.link)
        .bind(&entry.description)
        .bind(&entry.file)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert entry {}", entry.identity()))?;
        Ok(exec.rows_affected() == 1)
    }

    async fn load(&self, channel_id: &str, max: usize) -> Result<Vec<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM castfeed.entry WHERE channel_id = $1 \
             ORDER BY published_at DESC, video_id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(channel_id)
            .bind(max as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Entry::from).collect())
    }

    async fn exists(&self, entry: &Entry) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM castfeed.entry WHERE channel_id = $1 AND video_id = $2
            )
            "#,
        )
        .bind(&entry.channel_id)
        .bind(&entry.video_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn remove_old(&self, channel_id: &str, keep: usize) -> Pruned {
        let stale = match sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT video_id, file
            FROM castfeed.entry
            WHERE channel_id = $1
            ORDER BY published_at DESC, video_id DESC
            OFFSET $2
            "#,
        )
        .bind(channel_id)
        .bind(keep as i64)
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => return Pruned { files: Vec::new(), error: Some(anyhow::Error::new(e).context("failed to select old entries")) },
        };

        let mut pruned = Pruned::default();
        let mut failed = 0usize;
        for (video_id, file) in stale {
            // one row at a time so a failure keeps the files of rows already gone
            let res = sqlx::query("DELETE FROM castfeed.entry WHERE channel_id = $1 AND video_id = $2")
                .bind(channel_id)
                .bind(&video_id)
                .execute(&self.pool)
                .await;
            match res {
                Ok(_) => {
                    if !file.is_empty() { pruned.files.push(file); }
                }
                Err(e) => {
                    failed += 1;
                    if pruned.error.is_none() {
                        pruned.error = Some(anyhow::Error::new(e).context(format!("failed to delete {channel_id}::{video_id}")));
                    }
                }
            }
        }
        if failed > 1 {
            pruned.error = pruned.error.map(|e| e.context(format!("{failed} entries not removed")));
        }
        pruned
    }

    async fn mark_processed(&self, entry: &Entry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO castfeed.processed (channel_id, video_id, processed_at)
            VALUES ($1, $2, now())
            ON CONFLICT (channel_id, video_id) DO UPDATE SET processed_at = EXCLUDED.processed_at
            "#,
        )
        .bind(&entry.channel_id)
        .bind(&entry.video_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn check_processed(&self, entry: &Entry) -> Result<Option<DateTime<Utc>>> {
        let ts: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT processed_at FROM castfeed.processed WHERE channel_id = $1 AND video_id = $2",
        )
        .bind(&entry.channel_id)
        .bind(&entry.video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ts)
    }

    async fn count_processed(&self) -> usize {
        let res: Result<i64, sqlx::Error> = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM castfeed.processed")
            .fetch_one(&self.pool)
            .await;
        match res {
            Ok(n) => n.max(0) as usize,
            Err(e) => {
                warn!("failed to count processed entries: {e}");
                0
            }
        }
    }

    async fn most_recent(&self) -> Result<Option<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM castfeed.entry ORDER BY published_at DESC, video_id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Entry::from))
    }
}
