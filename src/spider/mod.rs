// src/spider/mod.rs
// =============================================================================
// This module contains the extraction side of the crawler.
//
// A spider turns one fetched page into:
// - records (DocumentItem) for the item pipeline
// - follow-up requests for the crawl driver to fetch next
//
// Every request carries a Callback saying which parse routine should handle
// its response. The driver never needs to know what a spider does with a
// page; it just hands the page back with the callback it asked for.
//
// Submodules:
// - selectors: CSS selector configuration (defaults + JSON file loading)
// - wines: the wine-selection.com shop spider
//
// Rust concepts:
// - Traits: a common interface the crawl driver can be generic over
// - Enums with data: one output type for "item or request"
// =============================================================================

mod selectors;
mod wines;

pub use selectors::{FieldSelector, SelectorConfig};
pub use wines::WinesSpider;

use crate::item::DocumentItem;
use serde::{Deserialize, Serialize};

/// Which parse routine handles a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    /// The start page: yields products and discovers pagination
    Listing,
    /// A page reached through pagination: yields products only
    Page,
}

/// A page the spider wants fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub callback: Callback,
}

impl Request {
    pub fn new(url: impl Into<String>, callback: Callback) -> Self {
        Self {
            url: url.into(),
            callback,
        }
    }
}

/// A fetched page: the final URL and its HTML body
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub html: String,
}

/// Everything a parse routine can yield
#[derive(Debug, Clone, PartialEq)]
pub enum SpiderOutput {
    Item(DocumentItem),
    Request(Request),
}

/// How record ids are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IdStrategy {
    /// A fresh random UUID for every scraped record
    #[default]
    Random,
    /// An id derived from the scraper name and the product's identity
    Deterministic,
}

// The interface the crawl driver runs
//
// parse() is synchronous and does no I/O: everything it needs is in the page.
pub trait Spider {
    fn name(&self) -> &str;

    /// Requests that seed the crawl
    fn start_requests(&self) -> Vec<Request>;

    /// Parses one page with the routine its request asked for
    fn parse(&self, callback: Callback, page: &Page) -> Vec<SpiderOutput>;
}
