// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - crawl: run the wine shop spider and print or stream the records
// - uid:   print the deterministic record id for a name and some values
//
// Logging is configured through the RUST_LOG environment variable, not flags.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wine_spider::crawl::DEFAULT_USER_AGENT;
use wine_spider::spider::{IdStrategy, WinesSpider};

#[derive(Parser, Debug)]
#[command(
    name = "wine-spider",
    version,
    about = "Crawls a paginated WooCommerce shop and extracts product records",
    long_about = "wine-spider walks the product listing of a WooCommerce shop, follows its \
                  pagination and extracts name, price and link for every product."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the shop and extract product records
    ///
    /// Example: wine-spider crawl --json --max-pages 5
    Crawl(CrawlArgs),

    /// Print the deterministic id for a scraper name and values
    ///
    /// Example: wine-spider uid extract https://www.wine-selection.com/shop/chablis/
    Uid {
        /// Scraper name the id is namespaced by
        name: String,

        /// Values appended to the name before hashing
        values: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct CrawlArgs {
    /// Listing page to start from
    #[arg(long, default_value = WinesSpider::START_URL)]
    pub start_url: String,

    /// Stream records as JSON lines instead of printing a table
    #[arg(long)]
    pub json: bool,

    /// Stop after fetching this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Pages fetched at the same time
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Delay between waves of requests, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Fetch every discovered page, even if it was already requested
    #[arg(long)]
    pub no_dedupe: bool,

    /// How record ids are assigned
    #[arg(long, value_enum, default_value_t = IdStrategy::Random)]
    pub id_strategy: IdStrategy,

    /// JSON file overriding the default CSS selectors
    #[arg(long)]
    pub selectors: Option<PathBuf>,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}
