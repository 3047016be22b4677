// src/crawl/mod.rs
// =============================================================================
// This module runs spiders against real websites.
//
// Features:
// - Breadth-first crawling from a spider's start requests
// - Callback dispatch: each page goes back to the routine that asked for it
// - Request de-duplication and an optional page limit
// - Bounded concurrent fetching with a polite delay between waves
//
// Submodules:
// - fetch: the Fetcher trait and its reqwest implementation
// - queue: the crawl loop itself
// =============================================================================

mod fetch;
mod queue;

pub use fetch::{Fetcher, HttpFetcher, DEFAULT_USER_AGENT};
pub use queue::{crawl, CrawlSettings, CrawlStats};
