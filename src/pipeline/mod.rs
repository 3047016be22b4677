// src/pipeline/mod.rs
// =============================================================================
// This module receives the records a crawl produces.
//
// The crawl driver pushes every DocumentItem into an ItemPipeline as soon as
// it is scraped. Two pipelines ship here:
// - JsonLinesPipeline: writes each serialized record as one JSON line
// - Vec<DocumentItem>: keeps records in memory (table output, tests)
//
// Anything that stores records elsewhere (a database, object storage) only
// has to implement the trait.
//
// Rust concepts:
// - Generic structs: JsonLinesPipeline works with any io::Write
// - Implementing a trait for a std type (Vec)
// =============================================================================

use crate::item::DocumentItem;
use anyhow::{Context, Result};
use std::io::Write;

/// A consumer of scraped records
pub trait ItemPipeline {
    fn process_item(&mut self, item: DocumentItem) -> Result<()>;
}

impl ItemPipeline for Vec<DocumentItem> {
    fn process_item(&mut self, item: DocumentItem) -> Result<()> {
        self.push(item);
        Ok(())
    }
}

// Streams records as JSON lines
//
// Each line is the serialized form of one record, including the empty
// `source_file` slot. The writer is flushed after every line so a consumer
// reading a pipe sees records as they are scraped.
pub struct JsonLinesPipeline<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesPipeline<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ItemPipeline for JsonLinesPipeline<W> {
    fn process_item(&mut self, item: DocumentItem) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &item.serialize())
            .with_context(|| format!("Failed to serialize item {}", item.id()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.written += 1;
        Ok(())
    }
}
