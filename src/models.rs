//! Core data types: the raw wire document and the canonical indexed record.
//!
//! A [`WireRecord`] lives only for the duration of one fetch. [`transform`]
//! turns it into a [`CanonicalRecord`], which is what the index stores.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvalidDate;

/// Default remote site; also where strip pages live.
pub const DEFAULT_SITE: &str = "https://xkcd.com";

/// One JSON document as published by the remote source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRecord {
    #[serde(rename = "num")]
    pub id: u64,
    #[serde(default)]
    pub safe_title: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub news: String,
    #[serde(default, deserialize_with = "int_or_string")]
    pub year: u32,
    #[serde(default, deserialize_with = "int_or_string")]
    pub month: u32,
    #[serde(default, deserialize_with = "int_or_string")]
    pub day: u32,
}

impl WireRecord {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// The plain-text title, preferring `safe_title`.
    pub fn display_title(&self) -> &str {
        if self.safe_title.is_empty() {
            &self.title
        } else {
            &self.safe_title
        }
    }

    /// Zero-padded `YYYY-MM-DD`, not checked against the calendar.
    pub fn date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// The source encodes date parts as numeric strings (`"2020"`); accept both forms.
fn int_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) if s.trim().is_empty() => Ok(0),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// The normalized record stored in the index, keyed by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalRecord {
    pub id: i64,
    #[sqlx(default)]
    pub title: String,
    #[sqlx(default)]
    pub transcript: String,
    #[sqlx(default)]
    pub comment: String,
    #[sqlx(default)]
    pub img: String,
    /// `YYYY-MM-DD`, possibly not a real calendar date.
    #[sqlx(default)]
    pub date: String,
}

impl CanonicalRecord {
    /// Parse the stored date for display.
    pub fn display_date(&self) -> Result<NaiveDate, InvalidDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| InvalidDate(self.date.clone()))
    }

    pub fn summary(&self) -> String {
        format!(
            "XKCD {} ({}): {}\n\tstrip: {}\n",
            self.id, self.date, self.title, self.img
        )
    }

    /// Public page of the strip on `site`.
    pub fn url_on(&self, site: &str) -> String {
        format!("{}/{}", site.trim_end_matches('/'), self.id)
    }
}

/// Map a wire document onto the canonical record. Pure; never fails.
pub fn transform(wire: &WireRecord) -> CanonicalRecord {
    CanonicalRecord {
        id: wire.id as i64,
        title: wire.display_title().to_string(),
        transcript: wire.transcript.clone(),
        comment: wire.alt.clone(),
        img: wire.img.clone(),
        date: wire.date(),
    }
}
