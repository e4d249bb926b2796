//! # xkcd-archive
//!
//! A local, searchable archive of xkcd strips, kept in sync with the
//! remote JSON feed (`<base>/<id>/info.0.json`).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ Gap resolver │──▶│ HttpFetcher  │──▶│ transform  │──▶│  writer  │
//! │ (missing IDs)│   │ (gated GETs) │   │ (canonical)│   │  task    │
//! └──────▲───────┘   └──────────────┘   └────────────┘   └────┬─────┘
//!        │                                                    ▼
//!        └────────────── existing IDs ────────────────── SQLite FTS5
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! xka init                 # create the index
//! xka refresh -c 4         # fetch every missing strip, 4 at a time
//! xka search "bobby tables"
//! xka search -l "compiling" # print only the best URL
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Wire and canonical records, [`models::transform`] |
//! | [`error`] | Typed per-item errors |
//! | [`gap`] | Missing-ID computation and the deny-list |
//! | [`gate`] | Concurrency gate for remote fetches |
//! | [`fetch`] | [`fetch::Source`] trait and the HTTP fetcher |
//! | [`store`] | [`store::Index`] trait and the in-memory index |
//! | [`sqlite_store`] | SQLite FTS5 index |
//! | [`sync`] | Refresh pipeline |
//! | [`search`] | Threshold filtering and result formatting |
//! | [`get`] | Single-record display |
//! | [`stats`] | Index statistics |
//! | [`db`] | SQLite connection pool |
//! | [`migrate`] | Schema setup |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod gap;
pub mod gate;
pub mod get;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod search;
pub mod sqlite_store;
pub mod stats;
pub mod store;
pub mod sync;
