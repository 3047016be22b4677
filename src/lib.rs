// src/lib.rs
// =============================================================================
// wine-spider: a product spider for WooCommerce shop listings.
//
// Modules:
// - item:     the scraped record (DocumentItem) and its id helper
// - spider:   turns fetched pages into records and follow-up requests
// - crawl:    fetches pages and feeds them to a spider, breadth-first
// - pipeline: where records go once scraped
//
// The `wine-spider` binary (src/main.rs) wires these together behind a CLI.
// =============================================================================

pub mod crawl;
pub mod item;
pub mod pipeline;
pub mod spider;
