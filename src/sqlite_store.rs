//! SQLite-backed [`Index`] implementation.
//!
//! Records live in the `strips` table; `strips_fts` is an FTS5 mirror of
//! the searchable columns. Keyword ranking is BM25 with the title weighted
//! highest, reported as a positive score (higher is better).

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::db;
use crate::migrate;
use crate::models::CanonicalRecord;
use crate::store::{query_terms, Hit, Index, QueryOptions, SortBy};

/// SQLite implementation of the [`Index`] trait.
pub struct SqliteIndex {
    pool: SqlitePool,
}

/// A stored row plus the score the query assigned to it.
#[derive(FromRow)]
struct HitRow {
    #[sqlx(flatten)]
    record: CanonicalRecord,
    score: f64,
}

impl From<HitRow> for Hit {
    fn from(row: HitRow) -> Self {
        Hit {
            score: row.score,
            record: row.record,
        }
    }
}

impl SqliteIndex {
    /// Open the index at `path`, creating the file and schema if needed.
    pub async fn open_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "creating the index");
        }
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn order_clause(sort: SortBy) -> &'static str {
    match sort {
        SortBy::Score => "score DESC, id ASC",
        SortBy::IdAsc => "id ASC",
        SortBy::IdDesc => "id DESC",
        SortBy::DateDesc => "date DESC, id DESC",
    }
}

/// Quote every term so FTS5 treats it as a literal; any term may match.
fn fts_expression(text: &str) -> Option<String> {
    let terms = query_terms(text);
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

#[async_trait]
impl Index for SqliteIndex {
    async fn index(&self, record: &CanonicalRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO strips (id, title, transcript, comment, img, date)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                transcript = excluded.transcript,
                comment = excluded.comment,
                img = excluded.img,
                date = excluded.date
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.transcript)
        .bind(&record.comment)
        .bind(&record.img)
        .bind(&record.date)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM strips_fts WHERE id = ?")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO strips_fts (id, title, comment, transcript) VALUES (?, ?, ?, ?)")
            .bind(record.id)
            .bind(&record.title)
            .bind(&record.comment)
            .bind(&record.transcript)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<CanonicalRecord>> {
        let record = sqlx::query_as::<_, CanonicalRecord>(
            "SELECT id, title, transcript, comment, img, date FROM strips WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn query(&self, text: &str, opts: &QueryOptions) -> Result<Vec<Hit>> {
        let expr = match fts_expression(text) {
            Some(e) => e,
            None => return Ok(Vec::new()),
        };

        let sql = format!(
            r#"
            SELECT s.id AS id, s.title AS title, s.transcript AS transcript,
                   s.comment AS comment, s.img AS img, s.date AS date,
                   -bm25(strips_fts, 0.0, 10.0, 2.0, 1.0) AS score
            FROM strips_fts
            JOIN strips s ON s.id = strips_fts.id
            WHERE strips_fts MATCH ?
            ORDER BY {}
            LIMIT ?
            "#,
            order_clause(opts.sort)
        );

        let rows = sqlx::query_as::<_, HitRow>(&sql)
            .bind(&expr)
            .bind(opts.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Hit::from).collect())
    }

    async fn match_all(&self, opts: &QueryOptions) -> Result<Vec<Hit>> {
        let sql = format!(
            r#"
            SELECT id, title, transcript, comment, img, date, 1.0 AS score
            FROM strips
            ORDER BY {}
            LIMIT ?
            "#,
            order_clause(opts.sort)
        );

        let rows = sqlx::query_as::<_, HitRow>(&sql)
            .bind(opts.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Hit::from).collect())
    }

    async fn existing_ids(&self, upper_bound: Option<u64>) -> Result<HashSet<u64>> {
        let bound = upper_bound.map_or(i64::MAX, |b| b.min(i64::MAX as u64) as i64);
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM strips WHERE id <= ?")
            .bind(bound)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().filter(|id| *id > 0).map(|id| id as u64).collect())
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM strips")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn max_id(&self) -> Result<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM strips")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }
}
