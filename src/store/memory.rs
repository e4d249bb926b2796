//! In-memory [`Index`] implementation for tests.
//!
//! Records live in a `BTreeMap` behind `std::sync::RwLock`. Keyword
//! scoring is a plain count of matching terms, title matches counting
//! double.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::CanonicalRecord;

use super::{query_terms, Hit, Index, QueryOptions, SortBy};

#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<BTreeMap<i64, CanonicalRecord>>,
    writes: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated index.
    pub fn with_records<I: IntoIterator<Item = CanonicalRecord>>(records: I) -> Self {
        let map = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            records: RwLock::new(map),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `index` calls made so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<i64, CanonicalRecord>>> {
        self.records.read().map_err(|_| anyhow!("in-memory index lock poisoned"))
    }
}

fn score(record: &CanonicalRecord, terms: &[String]) -> f64 {
    let title = record.title.to_lowercase();
    let body = format!("{} {}", record.comment, record.transcript).to_lowercase();
    terms
        .iter()
        .map(|t| {
            let mut s = 0.0;
            if title.contains(t.as_str()) {
                s += 2.0;
            }
            if body.contains(t.as_str()) {
                s += 1.0;
            }
            s
        })
        .sum()
}

fn sort_hits(hits: &mut [Hit], sort: SortBy) {
    match sort {
        SortBy::Score => hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.record.id.cmp(&b.record.id))
        }),
        SortBy::IdAsc => hits.sort_by_key(|h| h.record.id),
        SortBy::IdDesc => hits.sort_by(|a, b| b.record.id.cmp(&a.record.id)),
        SortBy::DateDesc => hits.sort_by(|a, b| {
            b.record
                .date
                .cmp(&a.record.date)
                .then(b.record.id.cmp(&a.record.id))
        }),
    }
}

#[async_trait]
impl Index for InMemoryIndex {
    async fn index(&self, record: &CanonicalRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        records.insert(record.id, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<CanonicalRecord>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn query(&self, text: &str, opts: &QueryOptions) -> Result<Vec<Hit>> {
        let terms = query_terms(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<Hit> = self
            .read()?
            .values()
            .filter_map(|r| {
                let s = score(r, &terms);
                (s > 0.0).then(|| Hit {
                    score: s,
                    record: r.clone(),
                })
            })
            .collect();
        sort_hits(&mut hits, opts.sort);
        hits.truncate(opts.limit.max(0) as usize);
        Ok(hits)
    }

    async fn match_all(&self, opts: &QueryOptions) -> Result<Vec<Hit>> {
        let mut hits: Vec<Hit> = self
            .read()?
            .values()
            .map(|r| Hit {
                score: 1.0,
                record: r.clone(),
            })
            .collect();
        sort_hits(&mut hits, opts.sort);
        hits.truncate(opts.limit.max(0) as usize);
        Ok(hits)
    }

    async fn existing_ids(&self, upper_bound: Option<u64>) -> Result<HashSet<u64>> {
        let bound = upper_bound.map_or(i64::MAX, |b| b.min(i64::MAX as u64) as i64);
        Ok(self.read()?.range(..=bound).map(|(id, _)| *id as u64).collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.read()?.len() as i64)
    }
}
