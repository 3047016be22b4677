// src/crawl/queue.rs
// =============================================================================
// This module drives a spider across a website, breadth-first.
//
// How it works:
// 1. Seed a queue with the spider's start requests
// 2. Take up to `concurrency` requests off the front of the queue (a "wave")
// 3. Fetch the wave concurrently
// 4. Hand each page to the spider with the callback its request carried
// 5. Send records to the item pipeline, push new requests onto the queue
// 6. Repeat until the queue is empty
//
// Limits:
// - Already-requested URLs are skipped (unless de-duplication is off)
// - At most `max_pages` pages are fetched
// - A short delay between waves keeps the crawl polite
//
// A page that fails to download is logged and counted, and the crawl moves
// on. Only a pipeline failure stops the crawl.
//
// Rust concepts:
// - HashSet: To track requested URLs (O(1) lookup)
// - VecDeque: FIFO queue for breadth-first crawling
// - Generics with trait bounds: any Spider, any Fetcher, any ItemPipeline
// - Streams: buffered() runs fetches concurrently but keeps their order
// =============================================================================

use super::fetch::Fetcher;
use crate::pipeline::ItemPipeline;
use crate::spider::{Request, Spider, SpiderOutput};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Knobs for one crawl
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Stop fetching after this many pages (None = no limit)
    pub max_pages: Option<usize>,
    /// Pages fetched at the same time
    pub concurrency: usize,
    /// Pause between waves of fetches
    pub delay: Duration,
    /// Skip requests for URLs that were already requested
    pub dedupe_requests: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: None,
            concurrency: 8,
            delay: Duration::from_millis(100),
            dedupe_requests: true,
        }
    }
}

/// What happened during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub items_scraped: usize,
    /// Requests dropped as duplicates or past the page limit
    pub requests_skipped: usize,
}

// Runs `spider` until no requests are left
//
// Returns the crawl stats, or an error if the pipeline rejected an item.
pub async fn crawl<S, F, P>(
    spider: &S,
    fetcher: &F,
    settings: &CrawlSettings,
    pipeline: &mut P,
) -> Result<CrawlStats>
where
    S: Spider,
    F: Fetcher,
    P: ItemPipeline,
{
    let concurrency = settings.concurrency.max(1);

    let mut queue: VecDeque<Request> = spider.start_requests().into();
    let mut requested: HashSet<String> = HashSet::new();
    let mut scheduled = 0usize;
    let mut stats = CrawlStats::default();

    info!(
        spider = spider.name(),
        start_requests = queue.len(),
        max_pages = ?settings.max_pages,
        concurrency,
        "Starting crawl"
    );

    while !queue.is_empty() {
        // Build the next wave from the front of the queue
        let mut wave = Vec::with_capacity(concurrency);
        while wave.len() < concurrency {
            let Some(request) = queue.pop_front() else {
                break;
            };

            if settings.dedupe_requests && !requested.insert(request.url.clone()) {
                debug!(url = %request.url, "Skipping duplicate request");
                stats.requests_skipped += 1;
                continue;
            }

            if settings.max_pages.is_some_and(|max| scheduled >= max) {
                debug!(url = %request.url, "Skipping request past page limit");
                stats.requests_skipped += 1;
                continue;
            }

            scheduled += 1;
            wave.push(request);
        }

        if wave.is_empty() {
            continue;
        }

        let responses: Vec<_> = stream::iter(wave)
            .map(|request| async move {
                let result = fetcher.fetch(&request.url).await;
                (request, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        for (request, result) in responses {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %request.url, error = %e, "Failed to fetch page");
                    stats.pages_failed += 1;
                    continue;
                }
            };

            stats.pages_fetched += 1;
            let outputs = spider.parse(request.callback, &page);

            let mut items = 0usize;
            let mut follow_ups = 0usize;
            for output in outputs {
                match output {
                    SpiderOutput::Item(item) => {
                        pipeline.process_item(item)?;
                        items += 1;
                    }
                    SpiderOutput::Request(next) => {
                        queue.push_back(next);
                        follow_ups += 1;
                    }
                }
            }
            stats.items_scraped += items;

            info!(
                url = %page.url,
                callback = ?request.callback,
                items,
                follow_ups,
                "Crawled page"
            );
        }

        // Polite crawling: small delay between waves
        if !queue.is_empty() && !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }

    info!(
        spider = spider.name(),
        pages_fetched = stats.pages_fetched,
        pages_failed = stats.pages_failed,
        items_scraped = stats.items_scraped,
        requests_skipped = stats.requests_skipped,
        "Crawl finished"
    );

    Ok(stats)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does buffered(N) do?
//    - Turns a stream of futures into a stream of their outputs
//    - Up to N futures are polled at the same time
//    - Outputs come back in the same order as the input futures
//    - buffer_unordered(N) is the same but yields in completion order
//
// 2. What is let-else?
//    - let Some(request) = queue.pop_front() else { break; };
//    - Binds `request` if the pattern matches, otherwise runs the else block
//    - The else block must leave the scope (break, continue, return)
//
// 3. Where does the spider run?
//    - parse() is called on this task, between fetches
//    - The queue, the requested set and the pipeline are plain locals
//    - Only fetches run concurrently, so nothing here needs a Mutex
// -----------------------------------------------------------------------------
