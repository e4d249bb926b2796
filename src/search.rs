//! Search over the local archive.
//!
//! Ranking is delegated to the [`Index`]; this module applies the minimum
//! score threshold and formats results for the CLI. In "lucky" mode only
//! the URL of the best hit is printed.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::sqlite_store::SqliteIndex;
use crate::store::{Hit, Index, QueryOptions, SortBy};

/// Retrieval options, built from config and CLI flags by the caller.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub min_score: f64,
    pub limit: i64,
}

impl From<&Config> for SearchOptions {
    fn from(config: &Config) -> Self {
        Self {
            min_score: config.search.min_score,
            limit: config.search.limit,
        }
    }
}

/// Hits split by the score threshold.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Hits scoring at least `min_score`, best first.
    pub accepted: Vec<Hit>,
    /// Number of hits below the threshold.
    pub below_threshold: usize,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&Hit> {
        self.accepted.first()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.below_threshold == 0
    }
}

pub async fn search<I: Index + ?Sized>(
    index: &I,
    query: &str,
    opts: &SearchOptions,
) -> Result<SearchOutcome> {
    if query.trim().is_empty() {
        return Ok(SearchOutcome::default());
    }

    let hits = index
        .query(
            query,
            &QueryOptions {
                limit: opts.limit,
                sort: SortBy::Score,
            },
        )
        .await?;

    let (accepted, below): (Vec<Hit>, Vec<Hit>) =
        hits.into_iter().partition(|h| h.score >= opts.min_score);

    Ok(SearchOutcome {
        accepted,
        below_threshold: below.len(),
    })
}

/// Render a normal-mode result list.
pub fn format_results(outcome: &SearchOutcome, min_score: f64) -> String {
    let mut out = String::new();
    if outcome.is_empty() {
        out.push_str("No results.\n");
        return out;
    }
    out.push_str("Your search results:\n");
    for (pos, hit) in outcome.accepted.iter().enumerate() {
        out.push_str(&format!("{} - ({:.2}) {}", pos, hit.score, hit.record.summary()));
    }
    if outcome.below_threshold > 0 {
        out.push_str(&format!(
            "We also found {} results below the threshold ({:.2})\n",
            outcome.below_threshold, min_score
        ));
    }
    out
}

/// CLI entry point for `xka search`. Returns `false` when lucky mode found
/// nothing above the threshold.
pub async fn run_search(config: &Config, query: &str, lucky: bool) -> Result<bool> {
    let index = SqliteIndex::open_or_create(&config.db.path)
        .await
        .with_context(|| format!("Unable to open the index at {}", config.db.path.display()))?;
    let opts = SearchOptions::from(config);
    let outcome = search(&index, query, &opts).await;
    index.close().await;
    let outcome = outcome?;

    if lucky {
        return match outcome.best() {
            Some(hit) => {
                println!("{}", hit.record.url_on(&config.source.base_url));
                Ok(true)
            }
            None => {
                println!("No result matching the query above the minimum score");
                Ok(false)
            }
        };
    }

    print!("{}", format_results(&outcome, opts.min_score));
    Ok(true)
}
