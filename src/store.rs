//! SQLite-backed storage handle for the `pull_requests` table.
//!
//! A [`PullRequestStore`] is opened once at process start and handed to the
//! indexer and the query layer. Cloning is cheap (the pool is reference
//! counted), so concurrent indexing tasks each hold their own clone.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::error::StorageError;
use crate::migrate;
use crate::models::{DateWindow, PullRequest};

#[derive(Clone)]
pub struct PullRequestStore {
    pool: SqlitePool,
}

impl PullRequestStore {
    /// Connects to the configured database and creates the schema if missing.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Upserts one page of pull requests in a single transaction.
    ///
    /// Either every row of the page is written or none is. Returns the number
    /// of rows written.
    pub async fn upsert_page(&self, prs: &[PullRequest]) -> Result<u64, StorageError> {
        if prs.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for pr in prs {
            sqlx::query(
                r#"
                INSERT INTO pull_requests (repo_name, pr_number, title, author_login, created_at, closed_at, diff)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(repo_name, pr_number) DO UPDATE SET
                    title = excluded.title,
                    author_login = excluded.author_login,
                    created_at = excluded.created_at,
                    closed_at = excluded.closed_at,
                    diff = excluded.diff
                "#,
            )
            .bind(&pr.repo_name)
            .bind(pr.pr_number)
            .bind(&pr.title)
            .bind(&pr.author_login)
            .bind(pr.created_at.timestamp())
            .bind(pr.closed_at.timestamp())
            .bind(&pr.diff)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(prs.len() as u64)
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pull_requests")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_closed_between(&self, window: &DateWindow) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pull_requests WHERE closed_at >= ? AND closed_at <= ?",
        )
        .bind(window.start.timestamp())
        .bind(window.end.timestamp())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Rows closed inside `window`, most recently closed first.
    pub async fn list_closed_between(
        &self,
        window: &DateWindow,
        limit: i64,
    ) -> Result<Vec<PullRequest>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT repo_name, pr_number, title, author_login, created_at, closed_at, diff
            FROM pull_requests
            WHERE closed_at >= ? AND closed_at <= ?
            ORDER BY closed_at DESC, pr_number DESC
            LIMIT ?
            "#,
        )
        .bind(window.start.timestamp())
        .bind(window.end.timestamp())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_pull_request).collect())
    }

    /// The first `limit` rows, most recently closed first.
    pub async fn list(&self, limit: i64) -> Result<Vec<PullRequest>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT repo_name, pr_number, title, author_login, created_at, closed_at, diff
            FROM pull_requests
            ORDER BY closed_at DESC, repo_name ASC, pr_number DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_pull_request).collect())
    }

    /// Deletes every row. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM pull_requests")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_pull_request(row: &SqliteRow) -> PullRequest {
    PullRequest {
        repo_name: row.get("repo_name"),
        pr_number: row.get("pr_number"),
        title: row.get("title"),
        author_login: row.get("author_login"),
        created_at: from_unix(row.get("created_at")),
        closed_at: from_unix(row.get("closed_at")),
        diff: row.get("diff"),
    }
}

fn from_unix(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}
