// src/item/document.rs
// =============================================================================
// This module defines the record we produce for every scraped product.
//
// A DocumentItem carries:
// - where it came from (url, scraper name, scraper version)
// - when it was captured (timestamp, UTC)
// - what was found (data: field name -> value, None when nothing matched)
//
// It also owns the identifier helper `create_uid_from`, which turns a scraper
// name plus any number of values into a stable UUID-formatted string. The
// same inputs always give the same id, so repeated scrapes of one product can
// be matched up downstream.
//
// Rust concepts:
// - Private fields + getters: the record cannot be changed once built
// - Generics with trait bounds: accept any list of Display values
// - serde(flatten): reuse one struct's fields inside another when serializing
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Display;
use uuid::Uuid;

// Extracted values keyed by field name ("name", "price", "link", ...)
//
// None is the missing-value marker: the selector found nothing.
pub type ItemData = BTreeMap<String, Option<String>>;

/// One scraped product observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentItem {
    id: String,
    url: String,
    scraper: String,
    version: String,
    timestamp: DateTime<Utc>,
    data: ItemData,
}

impl DocumentItem {
    // Builds a record from all six fields
    //
    // Nothing is validated: ids, URLs and values are taken as given.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        scraper: impl Into<String>,
        version: impl Into<String>,
        timestamp: DateTime<Utc>,
        data: ItemData,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            scraper: scraper.into(),
            version: version.into(),
            timestamp,
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scraper(&self) -> &str {
        &self.scraper
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    /// Value of one data field, or None if it is missing or was not matched.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|value| value.as_deref())
    }

    // Returns the view handed to storage pipelines
    //
    // It has every field of the record plus `source_file`, which starts out
    // empty. Calling this twice gives two equal values.
    pub fn serialize(&self) -> SerializedItem {
        SerializedItem {
            item: self.clone(),
            source_file: None,
        }
    }

    // Generates a UUID-formatted id from a scraper name and some values
    //
    // The name and the Display form of each value are joined with no
    // separator, hashed with SHA-256, and every other hex digit of the digest
    // (32 of the 64) becomes the UUID.
    //
    // Example:
    //   create_uid_from("extract", ["https://shop/a"]) gives the same id on
    //   every run, on every machine.
    pub fn create_uid_from<I>(name: &str, values: I) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let mut encoded = String::from(name);
        for value in values {
            encoded.push_str(&value.to_string());
        }

        let digest = Sha256::digest(encoded.as_bytes());

        // Hex digits at even positions are the high nibbles of each digest
        // byte, so two bytes of digest fold into one byte of UUID.
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (digest[2 * i] & 0xF0) | (digest[2 * i + 1] >> 4);
        }

        Uuid::from_bytes(bytes).to_string()
    }
}

// The serialized form of a DocumentItem
//
// Flattened into one JSON object:
//   {"id": .., "url": .., "scraper": .., "version": .., "timestamp": ..,
//    "data": {..}, "source_file": null}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedItem {
    #[serde(flatten)]
    pub item: DocumentItem,
    /// File reference attached by a later pipeline stage
    pub source_file: Option<String>,
}

impl SerializedItem {
    // Attaches a file reference, leaving the record fields untouched
    pub fn with_source_file(self, source_file: impl Into<String>) -> Self {
        Self {
            source_file: Some(source_file.into()),
            ..self
        }
    }
}
