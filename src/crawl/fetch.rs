// src/crawl/fetch.rs
// =============================================================================
// This module downloads pages for the crawl driver.
//
// Fetching sits behind the `Fetcher` trait so the driver can be run against
// canned HTML in tests. `HttpFetcher` is the real implementation on top of a
// reqwest Client.
//
// Rust concepts:
// - async-trait: async methods in a trait
// - Builder pattern: Client::builder() for timeouts, redirects, user agent
// =============================================================================

use crate::spider::Page;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("wine-spider/", env!("CARGO_PKG_VERSION"));

/// Something that can turn a URL into a Page
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds a fetcher with a per-request timeout and a custom user agent
    //
    // Redirects are followed (up to 5); the Page keeps the final URL so
    // relative links resolve against the page that was actually served.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;

        Ok(Page {
            url: final_url,
            html,
        })
    }
}
