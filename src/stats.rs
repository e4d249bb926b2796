//! Index statistics: how much of the archive is stored locally.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::sqlite_store::SqliteIndex;
use crate::store::Index;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let index = SqliteIndex::open_or_create(&config.db.path)
        .await
        .with_context(|| format!("Unable to open the index at {}", config.db.path.display()))?;

    let total = index.count().await?;
    let latest = index.max_id().await?;
    index.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Index:       {}", config.db.path.display());
    println!("Size:        {}", format_bytes(db_size));
    println!("Strips:      {}", total);
    match latest {
        Some(id) => println!("Highest ID:  {}", id),
        None => println!("Highest ID:  (empty)"),
    }
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
