//! Refresh pipeline: bring the local index up to date with the source.
//!
//! One run goes through these steps:
//!
//! 1. **Resolve latest** – ask the source for its newest ID. Failure aborts
//!    the run before anything is written.
//! 2. **Resolve gap** – read the existing IDs from the index and compute the
//!    IDs to fetch ([`resolve_gap`]). An empty gap ends the run.
//! 3. **Dispatch** – spawn one task per missing ID: fetch, transform, hand
//!    the record to the writer. Parallelism is bounded by the fetcher's
//!    concurrency gate.
//! 4. **Join** – wait for every task, whatever its outcome.
//! 5. **Report** – return counts; failed IDs stay missing and are retried by
//!    the next run.
//!
//! Index writes are serialized: tasks send records over a bounded channel
//! to a single writer task, which is the only caller of [`Index::index`]
//! during a run.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::{Config, Window};
use crate::fetch::{HttpFetcher, Source};
use crate::gap::{resolve_gap, DenyList, GapRequest};
use crate::models::{transform, CanonicalRecord};
use crate::sqlite_store::SqliteIndex;
use crate::store::Index;

/// Per-run knobs, taken from config and CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// 0 means unbounded.
    pub max_records: usize,
    pub window: Window,
}

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Newest ID reported by the source.
    pub latest: u64,
    /// IDs the gap resolver asked for, in order.
    pub requested: Vec<u64>,
    /// Records committed to the index.
    pub indexed: usize,
    /// IDs whose fetch or write failed.
    pub failed: Vec<u64>,
}

impl RefreshReport {
    pub fn nothing_to_do(&self) -> bool {
        self.requested.is_empty()
    }
}

/// Capacity of the channel between fetch tasks and the writer.
const WRITE_QUEUE: usize = 64;

/// Run one refresh against `source`, writing into `index`.
///
/// Returns an error only when the newest ID cannot be determined or the
/// existing IDs cannot be read. Per-item failures are counted in the report
/// and logged at debug level only.
pub async fn refresh(
    index: Arc<dyn Index>,
    source: Arc<dyn Source>,
    deny: &DenyList,
    opts: RefreshOptions,
) -> Result<RefreshReport> {
    tracing::debug!("fetching the latest ID");
    let latest = source
        .latest_id()
        .await
        .context("Could not determine the newest item")?;
    tracing::debug!(latest, "latest remote ID");

    let existing = index
        .existing_ids(Some(latest))
        .await
        .context("Could not read existing IDs from the index")?;
    tracing::debug!(stored = existing.len(), "existing IDs loaded");

    let requested = resolve_gap(&GapRequest {
        existing: &existing,
        newest: latest,
        deny,
        max_records: opts.max_records,
        window: opts.window,
    });

    if requested.is_empty() {
        tracing::info!("nothing to download");
        return Ok(RefreshReport {
            latest,
            ..Default::default()
        });
    }
    tracing::info!(count = requested.len(), "downloading missing items");

    let (tx, rx) = mpsc::channel::<CanonicalRecord>(WRITE_QUEUE);
    let writer = tokio::spawn(write_records(Arc::clone(&index), rx));

    let mut tasks = JoinSet::new();
    for &id in &requested {
        tracing::trace!(id, "scheduling download");
        let source = Arc::clone(&source);
        let tx = tx.clone();
        tasks.spawn(async move {
            let wire = match source.fetch(id).await {
                Ok(w) => w,
                Err(e) => {
                    tracing::debug!(id, error = %e, "fetch failed");
                    return;
                }
            };
            let record = transform(&wire);
            // Only the requested key may be written; anything else could
            // replace a stored record.
            if record.id != id as i64 {
                tracing::debug!(id, got = record.id, "source returned a different ID");
                return;
            }
            if tx.send(record).await.is_err() {
                tracing::error!(id, "index writer stopped early");
            }
        });
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "download task panicked");
        }
    }

    let outcome = writer.await.context("index writer task failed")?;

    // Anything requested but not committed counts as failed, whether the
    // fetch or the write went wrong.
    let failed: Vec<u64> = requested
        .iter()
        .copied()
        .filter(|id| !outcome.committed.contains(&(*id as i64)))
        .collect();

    Ok(RefreshReport {
        latest,
        indexed: outcome.committed.len(),
        requested,
        failed,
    })
}

struct WriteOutcome {
    committed: HashSet<i64>,
}

/// Single writer: drains the channel and commits records one at a time.
async fn write_records(
    index: Arc<dyn Index>,
    mut rx: mpsc::Receiver<CanonicalRecord>,
) -> WriteOutcome {
    let mut committed = HashSet::new();
    while let Some(record) = rx.recv().await {
        match index.index(&record).await {
            Ok(()) => {
                tracing::debug!(id = record.id, title = %record.title, "indexed");
                committed.insert(record.id);
            }
            Err(e) => tracing::debug!(id = record.id, error = %e, "error indexing"),
        }
    }
    WriteOutcome { committed }
}

/// CLI entry point for `xka refresh`.
pub async fn run_refresh(config: &Config) -> Result<()> {
    let index = SqliteIndex::open_or_create(&config.db.path)
        .await
        .with_context(|| format!("Unable to open the index at {}", config.db.path.display()))?;
    let index = Arc::new(index);

    let fetcher = HttpFetcher::new(&config.source).context("Unable to build the HTTP client")?;
    let opts = RefreshOptions {
        max_records: config.source.max_records,
        window: config.source.window,
    };

    let report = refresh(
        Arc::clone(&index) as Arc<dyn Index>,
        Arc::new(fetcher),
        &DenyList::builtin(),
        opts,
    )
    .await;
    index.close().await;
    let report = report?;

    println!("refresh");
    println!("  latest: {}", report.latest);
    if report.nothing_to_do() {
        println!("Nothing to download");
        return Ok(());
    }
    println!("  missing: {}", report.requested.len());
    println!("  indexed: {}", report.indexed);
    println!("  failed: {}", report.failed.len());
    println!("ok");
    Ok(())
}
