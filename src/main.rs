//! # xkcd-archive CLI (`xka`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `xka init` | Create the index and its schema |
//! | `xka refresh` | Download and index every missing strip |
//! | `xka search "<query>"` | Search the local archive |
//! | `xka get <id>` | Show one stored strip |
//! | `xka stats` | Show what the index holds |
//!
//! ## Examples
//!
//! ```bash
//! xka refresh --concurrency 4 --max-records 100
//! xka search "velociraptor" --min-score 1.5
//! xka search --lucky "exploits of a mom"
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use xkcd_archive::config;
use xkcd_archive::sqlite_store::SqliteIndex;
use xkcd_archive::{get, logging, search, stats, sync};

/// xkcd-archive: a local, searchable archive of xkcd strips.
///
/// Settings are read from a TOML file (`--config`); a missing file means
/// built-in defaults. Flags override the file for a single run.
#[derive(Parser)]
#[command(
    name = "xka",
    about = "xkcd-archive: a local, searchable archive of xkcd strips",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/xka.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index file and schema. Safe to run repeatedly.
    Init,

    /// Download the metadata of the missing strips into the local index.
    Refresh {
        /// Number of downloads allowed in flight at once.
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// The User-Agent header sent with every request.
        #[arg(short, long)]
        user_agent: Option<String>,

        /// Maximum number of strips to fetch in this run (0 = unbounded).
        #[arg(short, long)]
        max_records: Option<usize>,
    },

    /// Search the local archive. Quote multi-word queries on the shell.
    Search {
        /// The search query string.
        query: String,

        /// Hide results scoring below this value.
        #[arg(long)]
        min_score: Option<f64>,

        /// Maximum number of results to consider.
        #[arg(long)]
        limit: Option<i64>,

        /// Print only the URL of the best result; exit 1 if none clears the threshold.
        #[arg(short, long)]
        lucky: bool,
    },

    /// Show one stored strip.
    Get {
        /// Strip number.
        id: i64,
    },

    /// Show index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("showing logs at debug level");

    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let index = SqliteIndex::open_or_create(&cfg.db.path)
                .await
                .with_context(|| {
                    format!("Unable to open the index at {}", cfg.db.path.display())
                })?;
            index.close().await;
            println!("Index initialized");
        }
        Commands::Refresh {
            concurrency,
            user_agent,
            max_records,
        } => {
            if let Some(c) = concurrency {
                cfg.source.concurrency = c;
            }
            if let Some(ua) = user_agent {
                cfg.source.user_agent = ua;
            }
            if let Some(m) = max_records {
                cfg.source.max_records = m;
            }
            cfg.validate()?;
            sync::run_refresh(&cfg).await?;
        }
        Commands::Search {
            query,
            min_score,
            limit,
            lucky,
        } => {
            if let Some(s) = min_score {
                cfg.search.min_score = s;
            }
            if let Some(l) = limit {
                cfg.search.limit = l;
            }
            cfg.validate()?;
            if !search::run_search(&cfg, &query, lucky).await? {
                std::process::exit(1);
            }
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
