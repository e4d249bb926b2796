//! Typed errors for the fetch and display paths.
//!
//! Fatal, run-level failures are reported through `anyhow` with context;
//! the types here are the recoverable, per-item conditions callers match on.

use thiserror::Error;

/// Why a single item could not be fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, TLS, or body-read failure.
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status code >= 400.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not the expected JSON document.
    #[error("could not decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The concurrency gate was shut down while waiting for a slot.
    #[error("concurrency gate closed")]
    GateClosed(#[from] tokio::sync::AcquireError),
}

/// The year/month/day of a record do not form a calendar date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid date: {0}")]
pub struct InvalidDate(pub String);
