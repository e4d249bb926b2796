//! Index abstraction for the local archive.
//!
//! The [`Index`] trait is everything the refresh pipeline and the search
//! commands need from storage: keyed upserts, lookups, ranked full-text
//! queries, and unconditional enumeration. Two backends implement it:
//! [`SqliteIndex`](crate::sqlite_store::SqliteIndex) (FTS5, used by the
//! CLI) and [`InMemoryIndex`](memory::InMemoryIndex) (tests).
//!
//! Implementations must be `Send + Sync`. Concurrent writers are not
//! assumed to be safe; the refresh pipeline funnels every write through
//! a single writer task.

pub mod memory;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::CanonicalRecord;

/// Result ordering for [`Index::query`] and [`Index::match_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Best score first; ties broken by ascending ID.
    #[default]
    Score,
    IdAsc,
    IdDesc,
    /// Newest date first; ties broken by descending ID.
    DateDesc,
}

/// Options shared by all retrieval calls. Passed explicitly on every call.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub limit: i64,
    pub sort: SortBy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            sort: SortBy::Score,
        }
    }
}

/// One ranked match with its stored fields.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    /// Higher is better. Unconditional matches score 1.0.
    pub score: f64,
    pub record: CanonicalRecord,
}

#[async_trait]
pub trait Index: Send + Sync {
    /// Insert or replace the record keyed by its ID.
    async fn index(&self, record: &CanonicalRecord) -> Result<()>;

    /// Fetch one stored record.
    async fn get(&self, id: i64) -> Result<Option<CanonicalRecord>>;

    /// Ranked full-text query over title, comment, and transcript.
    async fn query(&self, text: &str, opts: &QueryOptions) -> Result<Vec<Hit>>;

    /// Every stored record, ordered and limited per `opts`.
    async fn match_all(&self, opts: &QueryOptions) -> Result<Vec<Hit>>;

    /// IDs currently stored, optionally only those `<= upper_bound`.
    async fn existing_ids(&self, upper_bound: Option<u64>) -> Result<HashSet<u64>>;

    /// Number of stored records.
    async fn count(&self) -> Result<i64>;

    /// Highest stored ID, if any.
    async fn max_id(&self) -> Result<Option<i64>> {
        let top = self
            .match_all(&QueryOptions {
                limit: 1,
                sort: SortBy::IdDesc,
            })
            .await?;
        Ok(top.first().map(|h| h.record.id))
    }
}

/// Split free text into terms for matching.
///
/// Anything that is not alphanumeric separates terms, so user input can
/// never carry query-language operators into the backend.
pub fn query_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
