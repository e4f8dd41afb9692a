//! # tea CLI
//!
//! ## Usage
//!
//! ```bash
//! tea --config ./config/tea.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tea init` | Create the SQLite database and schema |
//! | `tea index <repo>` | Index one repository over a date window |
//! | `tea index-all` | Index every configured repository concurrently |
//! | `tea count` | Print the number of stored pull requests |
//! | `tea clear` | Delete every stored pull request |
//! | `tea serve` | Start the HTTP server |
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tea_indexer::config;
use tea_indexer::indexer::{IndexOutcome, Indexer};
use tea_indexer::migrate;
use tea_indexer::models::DateWindow;
use tea_indexer::query::QueryService;
use tea_indexer::server;
use tea_indexer::store::PullRequestStore;
use tea_indexer::upstream::GitHubClient;

/// tea — indexes closed GitHub pull requests and serves team metrics.
#[derive(Parser)]
#[command(name = "tea", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tea.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Index closed pull requests of one repository.
    Index {
        /// Repository as `owner/name`.
        repo: String,

        /// Window start (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Window end, inclusive (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },

    /// Index every repository listed in `[indexer].repos` concurrently.
    IndexAll {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },

    /// Print the number of stored pull requests.
    Count,

    /// Delete every stored pull request.
    Clear,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index { repo, start, end } => {
            let window = DateWindow::parse(&start, &end)?;
            let store = PullRequestStore::open(&cfg).await?;
            let indexer = Indexer::new(
                Arc::new(GitHubClient::new(&cfg.github)?),
                store.clone(),
                cfg.indexer.page_size,
            );
            let result = indexer.index_repository(&repo, &window).await;
            store.close().await;
            print_outcome(&result?);
            println!("ok");
        }
        Commands::IndexAll { start, end } => {
            let window = DateWindow::parse(&start, &end)?;
            let store = PullRequestStore::open(&cfg).await?;
            let indexer = Indexer::new(
                Arc::new(GitHubClient::new(&cfg.github)?),
                store.clone(),
                cfg.indexer.page_size,
            );
            let results = indexer
                .index_all_repositories(&cfg.indexer.repos, &window)
                .await;
            store.close().await;

            let mut failed = 0;
            for r in &results {
                match &r.result {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => {
                        failed += 1;
                        println!("index {}", r.repo);
                        println!("  failed: {}", e);
                    }
                }
            }
            println!("repositories: {} ok, {} failed", results.len() - failed, failed);
        }
        Commands::Count => {
            let store = PullRequestStore::open(&cfg).await?;
            let count = QueryService::new(store.clone()).total_count().await;
            store.close().await;
            println!("{}", count?);
        }
        Commands::Clear => {
            let store = PullRequestStore::open(&cfg).await?;
            let removed = QueryService::new(store.clone()).clear_all().await;
            store.close().await;
            println!("removed {} pull requests", removed?);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &IndexOutcome) {
    println!("index {}", outcome.repo);
    println!("  pages fetched: {}", outcome.pages_fetched);
    println!("  upserted: {}", outcome.upserted);
    println!("  skipped (not closed): {}", outcome.skipped_unclosed);
    println!("  skipped (outside window): {}", outcome.skipped_outside_window);
    println!("  diff failures: {}", outcome.diff_failures);
}
