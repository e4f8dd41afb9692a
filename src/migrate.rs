use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Opens the database, creates the schema, and closes the pool again.
/// Backs the `tea init` command.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates `pull_requests` and its indexes if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pull_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo_name TEXT NOT NULL,
            pr_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            author_login TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            closed_at INTEGER NOT NULL,
            diff TEXT NOT NULL DEFAULT '',
            UNIQUE(repo_name, pr_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pull_requests_closed_at ON pull_requests(closed_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
