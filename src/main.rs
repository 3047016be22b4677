// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = some pages failed, 2 = error)
//
// Logs go to stderr so `crawl --json` output on stdout can be piped straight
// into another program.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs};
use std::time::Duration;
use wine_spider::crawl::{self, CrawlSettings, CrawlStats, HttpFetcher};
use wine_spider::item::DocumentItem;
use wine_spider::pipeline::JsonLinesPipeline;
use wine_spider::spider::{SelectorConfig, WinesSpider};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = crawl finished, every page fetched
//   Ok(1) = crawl finished, some pages failed to fetch
//   Err   = could not run (bad selectors, client setup, pipeline failure)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Uid { name, values } => {
            println!("{}", DocumentItem::create_uid_from(&name, &values));
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let config = match &args.selectors {
        Some(path) => SelectorConfig::from_json_file(path)?,
        None => SelectorConfig::default(),
    };

    let spider = WinesSpider::with_config(&args.start_url, &config)
        .context("Failed to build spider")?
        .with_id_strategy(args.id_strategy);

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs), &args.user_agent)?;

    let settings = CrawlSettings {
        max_pages: args.max_pages,
        concurrency: args.concurrency,
        delay: Duration::from_millis(args.delay_ms),
        dedupe_requests: !args.no_dedupe,
    };

    tracing::info!(
        start_url = %args.start_url,
        id_strategy = ?args.id_strategy,
        "Crawling shop"
    );

    let stats = if args.json {
        let stdout = std::io::stdout();
        let mut pipeline = JsonLinesPipeline::new(stdout.lock());
        let stats = crawl::crawl(&spider, &fetcher, &settings, &mut pipeline).await?;
        tracing::debug!(written = pipeline.written(), "Finished streaming items");
        stats
    } else {
        let mut items: Vec<DocumentItem> = Vec::new();
        let stats = crawl::crawl(&spider, &fetcher, &settings, &mut items).await?;
        print_table(&items, &stats);
        stats
    };

    if stats.pages_failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints records as a human-readable table in the terminal
fn print_table(items: &[DocumentItem], stats: &CrawlStats) {
    println!("{:<50} {:<12} {:<60}", "NAME", "PRICE", "LINK");
    println!("{}", "=".repeat(122));

    for item in items {
        println!(
            "{:<50} {:<12} {:<60}",
            truncate(item.field("name").unwrap_or("-"), 47),
            item.field("price").unwrap_or("-"),
            item.field("link").unwrap_or("-"),
        );
    }

    println!();
    println!("📊 Summary:");
    println!("   📄 Pages fetched: {}", stats.pages_fetched);
    println!("   ❌ Pages failed: {}", stats.pages_failed);
    println!("   🍷 Products: {}", stats.items_scraped);
    println!("   🔁 Requests skipped: {}", stats.requests_skipped);
}

// Shortens a value for display, cutting on a character boundary
fn truncate(value: &str, max_chars: usize) -> String {
    let value = value.trim();
    if value.chars().count() > max_chars {
        let cut: String = value.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}
