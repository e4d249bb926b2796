//! Record retrieval by ID.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::models::CanonicalRecord;
use crate::sqlite_store::SqliteIndex;
use crate::store::Index;

/// Render one record for display.
///
/// A stored date that is not a real calendar date is shown as stored,
/// with a warning logged; it never prevents display.
pub fn format_record(record: &CanonicalRecord, site: &str) -> String {
    let date = match record.display_date() {
        Ok(d) => d.format("%A, %B %-d, %Y").to_string(),
        Err(e) => {
            tracing::warn!(id = record.id, error = %e, "stored date is not a calendar date");
            record.date.clone()
        }
    };

    let mut out = String::new();
    out.push_str("--- Strip ---\n");
    out.push_str(&format!("id:         {}\n", record.id));
    out.push_str(&format!("title:      {}\n", record.title));
    out.push_str(&format!("date:       {}\n", date));
    out.push_str(&format!("url:        {}\n", record.url_on(site)));
    out.push_str(&format!("img:        {}\n", record.img));
    out.push_str(&format!("comment:    {}\n", record.comment));
    if !record.transcript.is_empty() {
        out.push_str("\n--- Transcript ---\n");
        out.push_str(&record.transcript);
        out.push('\n');
    }
    out
}

pub async fn get_record<I: Index + ?Sized>(index: &I, id: i64) -> Result<CanonicalRecord> {
    match index.get(id).await? {
        Some(r) => Ok(r),
        None => bail!("strip not found: {}", id),
    }
}

/// CLI entry point for `xka get`.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let index = SqliteIndex::open_or_create(&config.db.path)
        .await
        .with_context(|| format!("Unable to open the index at {}", config.db.path.display()))?;
    let record = get_record(&index, id).await;
    index.close().await;

    print!("{}", format_record(&record?, &config.source.base_url));
    Ok(())
}
