//! Idempotent schema setup for the archive index.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strips (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            transcript TEXT NOT NULL DEFAULT '',
            comment TEXT NOT NULL DEFAULT '',
            img TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='strips_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE strips_fts USING fts5(
                id UNINDEXED,
                title,
                comment,
                transcript
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strips_date ON strips(date DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
