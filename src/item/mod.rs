// src/item/mod.rs
// =============================================================================
// This module holds the record model: what one scraped product looks like
// and how it is identified and serialized.
// =============================================================================

mod document;

pub use document::{DocumentItem, ItemData, SerializedItem};
