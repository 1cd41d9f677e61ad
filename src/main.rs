// src/main.rs

//! arxiv-digest: incremental arXiv fetcher and mail digest CLI
//!
//! Queries the search API page by page, merges new or updated papers into
//! the local database, and emails a plain-text + HTML digest of what was
//! added, bucketed by category and filter match.

use clap::Parser;

use arxiv_digest::error::Result;
use arxiv_digest::models::Config;
use arxiv_digest::pipeline::{DigestBuilder, FetchOptions, run_fetch};
use arxiv_digest::services::{ArxivClient, Mailer};
use arxiv_digest::storage::PaperStore;

#[derive(Parser, Debug)]
#[command(
    name = "arxiv-digest",
    version,
    about = "Fetches new arXiv papers into a local database and emails a digest"
)]

/// CLI Arguments
struct Cli {
    /// Query for the search API, written in its own syntax
    #[arg(long, default_value = "cat:hep-ex+OR+hep-ph")]
    search_query: String,

    /// First result offset (0 = most recent)
    #[arg(long, default_value_t = 0)]
    start_index: usize,

    /// Upper bound on the result offset
    #[arg(long, default_value_t = 10_000)]
    max_index: usize,

    /// Page size passed to the API
    #[arg(long, default_value_t = 100)]
    results_per_iteration: usize,

    /// Base delay between pages in seconds
    #[arg(long, default_value_t = 5.0)]
    wait_time: f64,

    /// Stop early once a page adds nothing new
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    break_on_no_added: bool,

    /// Query and sort by update time instead of submission time
    #[arg(long)]
    updated_time: bool,

    /// Configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    /// Print the digest without sending mail
    #[arg(long)]
    no_email: bool,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let options = FetchOptions {
        search_query: cli.search_query,
        start_index: cli.start_index,
        max_index: cli.max_index,
        results_per_iteration: cli.results_per_iteration,
        wait_time_secs: cli.wait_time,
        break_on_no_added: cli.break_on_no_added,
        sort_by_updated: cli.updated_time,
    };

    log::info!("Searching arXiv for {}", options.search_query);

    let store = PaperStore::new(&config.store.db_path);
    let mut db = store.load().await;
    log::info!("Database has {} entries at start", db.len());

    let client = ArxivClient::new(&config.api)?;
    let mut builder = DigestBuilder::new();
    let outcome = run_fetch(&client, &options, &config.filters, &mut db, &mut builder).await?;

    // Persist only when the run changed something; an untouched database
    // file keeps its mtime and content.
    if outcome.added > 0 {
        log::info!(
            "Saving database with {} papers to {}",
            db.len(),
            config.store.db_path
        );
        store.save(&db).await?;
    } else {
        log::info!("No new papers; leaving {} untouched", config.store.db_path);
    }

    let digest = builder.finish(&config.mail.greeting);

    // Print the digest locally first so its content survives a failed send
    println!("{}", digest.text);

    if cli.no_email {
        log::info!("--no-email set; skipping delivery");
        return Ok(());
    }

    let mailer = Mailer::new(config.mail.clone())?;
    mailer.send(&digest.subject, &digest.text, &digest.html)?;

    Ok(())
}
