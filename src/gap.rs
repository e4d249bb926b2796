//! Gap resolution: which IDs a refresh has to fetch.
//!
//! Candidates run from the window start up to the newest remote ID in
//! increasing order. IDs already stored and IDs on the [`DenyList`] are
//! skipped; the result is cut at `max_records` when that is non-zero.

use std::collections::{BTreeMap, HashSet};

use crate::config::Window;

/// IDs the remote source will never serve, with the reason.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    entries: BTreeMap<u64, String>,
}

impl DenyList {
    /// The entries known to be permanently missing upstream.
    pub fn builtin() -> Self {
        Self::from_entries([(404, "This strip is not found on purpose")])
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(id, r)| (id, r.into())).collect(),
        }
    }

    pub fn reason(&self, id: u64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }
}

/// Inputs for one gap computation.
#[derive(Debug, Clone, Copy)]
pub struct GapRequest<'a> {
    pub existing: &'a HashSet<u64>,
    pub newest: u64,
    pub deny: &'a DenyList,
    /// 0 means unbounded.
    pub max_records: usize,
    pub window: Window,
}

/// Compute the ordered list of IDs to fetch. Deterministic for fixed inputs.
pub fn resolve_gap(req: &GapRequest<'_>) -> Vec<u64> {
    let start = match req.window {
        Window::FirstMissing => 1,
        Window::AfterHighest => req.existing.iter().max().map_or(1, |m| m + 1),
    };
    let limit = if req.max_records == 0 {
        usize::MAX
    } else {
        req.max_records
    };

    let mut gap = Vec::new();
    for id in start..=req.newest {
        if gap.len() >= limit {
            break;
        }
        if req.existing.contains(&id) {
            continue;
        }
        if let Some(reason) = req.deny.reason(id) {
            tracing::debug!(id, reason, "skipping deny-listed item");
            continue;
        }
        gap.push(id);
    }
    gap
}
