// src/spider/wines.rs
// =============================================================================
// This module implements the spider for the wine-selection.com shop.
//
// How it works:
// 1. The start page (Callback::Listing) is scanned for products
// 2. Each product element becomes one DocumentItem with name/price/link
// 3. The pagination bar on the start page is scanned for page links
// 4. Each page link becomes a Request with Callback::Page
// 5. Pages reached that way (Callback::Page) only yield products
//
// Nothing here can fail: a selector that matches nothing leaves a None in
// the record, and a pagination entry without a link is skipped.
//
// Rust concepts:
// - match on an enum: dispatching to the right parse routine
// - Iterators: mapping matched elements straight into records
// =============================================================================

use super::selectors::CompiledSelectors;
use super::{Callback, IdStrategy, Page, Request, SelectorConfig, Spider, SpiderOutput};
use crate::item::{DocumentItem, ItemData};
use anyhow::Result;
use chrono::Utc;
use scraper::{ElementRef, Html};
use url::Url;
use uuid::Uuid;

pub struct WinesSpider {
    start_url: String,
    selectors: CompiledSelectors,
    id_strategy: IdStrategy,
}

impl WinesSpider {
    pub const NAME: &'static str = "extract";
    pub const VERSION: &'static str = "5";
    pub const START_URL: &'static str = "https://www.wine-selection.com/shop";

    // Creates the spider with a custom start URL and selector config
    //
    // Returns an error only if a selector in the config is not valid CSS.
    pub fn with_config(start_url: &str, config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            start_url: start_url.to_string(),
            selectors: config.compile()?,
            id_strategy: IdStrategy::default(),
        })
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    // Start page: products plus one request per pagination link
    fn parse_listing(&self, page: &Page) -> Vec<SpiderOutput> {
        let document = Html::parse_document(&page.html);

        let mut outputs: Vec<SpiderOutput> = self
            .extract_items(&document, &page.url)
            .into_iter()
            .map(SpiderOutput::Item)
            .collect();

        outputs.extend(
            self.pagination_requests(&document, &page.url)
                .into_iter()
                .map(SpiderOutput::Request),
        );

        outputs
    }

    // Paginated page: products only
    fn parse_page(&self, page: &Page) -> Vec<SpiderOutput> {
        let document = Html::parse_document(&page.html);

        self.extract_items(&document, &page.url)
            .into_iter()
            .inspect(|item| tracing::debug!(item = ?item, "Scraped item"))
            .map(SpiderOutput::Item)
            .collect()
    }

    // Builds one record per product element, in document order
    fn extract_items(&self, document: &Html, page_url: &str) -> Vec<DocumentItem> {
        document
            .select(&self.selectors.product)
            .map(|product| self.build_item(product, page_url))
            .collect()
    }

    fn build_item(&self, product: ElementRef<'_>, page_url: &str) -> DocumentItem {
        let data: ItemData = self
            .selectors
            .fields
            .iter()
            .map(|(key, field)| (key.clone(), field.extract(product)))
            .collect();

        DocumentItem::new(
            self.assign_id(page_url, &data),
            page_url,
            Self::NAME,
            Self::VERSION,
            Utc::now(),
            data,
        )
    }

    // Picks the record id according to the id strategy
    //
    // Deterministic ids key on the product link, falling back to page URL +
    // name. A product with neither has nothing stable to key on and gets a
    // random id.
    fn assign_id(&self, page_url: &str, data: &ItemData) -> String {
        let value = |key: &str| data.get(key).and_then(|v| v.as_deref());

        match self.id_strategy {
            IdStrategy::Random => Uuid::new_v4().to_string(),
            IdStrategy::Deterministic => match (value("link"), value("name")) {
                (Some(link), _) => DocumentItem::create_uid_from(Self::NAME, [link]),
                (None, Some(name)) => DocumentItem::create_uid_from(Self::NAME, [page_url, name]),
                (None, None) => Uuid::new_v4().to_string(),
            },
        }
    }

    // Collects one request per pagination entry that carries a usable link
    //
    // Links are not de-duplicated here; "next" and a page number pointing at
    // the same URL both produce a request.
    fn pagination_requests(&self, document: &Html, page_url: &str) -> Vec<Request> {
        let base = Url::parse(page_url).ok();

        document
            .select(&self.selectors.pagination_item)
            .filter_map(|entry| self.selectors.pagination_link.extract(entry))
            .filter_map(|href| resolve_link(base.as_ref(), &href))
            .map(|url| Request::new(url, Callback::Page))
            .collect()
    }
}

impl Spider for WinesSpider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn start_requests(&self) -> Vec<Request> {
        vec![Request::new(self.start_url.clone(), Callback::Listing)]
    }

    fn parse(&self, callback: Callback, page: &Page) -> Vec<SpiderOutput> {
        match callback {
            Callback::Listing => self.parse_listing(page),
            Callback::Page => self.parse_page(page),
        }
    }
}

// Resolves a possibly-relative href against the page URL
//
// Returns None for empty hrefs, fragments and non-HTTP schemes, which the
// crawler could not fetch anyway.
fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => base?.join(href).ok()?,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_URL: &str = "https://www.wine-selection.com/shop";

    fn spider() -> WinesSpider {
        WinesSpider::with_config(WinesSpider::START_URL, &SelectorConfig::default()).unwrap()
    }

    fn product(name: &str, price: &str, link: &str) -> String {
        format!(
            r#"<li class="product">
                <a href="{link}" class="woocommerce-LoopProduct-link-wrapper">
                    <img src="/img.jpg">
                </a>
                <h2 class="woocommerce-loop-product_title">
                    <a class="woocommerce-LoopProduct-link" href="{link}">{name}</a>
                </h2>
                <span class="price">
                    <span class="woocommerce-Price-amount amount"><bdi><span class="woocommerce-Price-currencySymbol">€</span>{price}</bdi></span>
                </span>
            </li>"#
        )
    }

    fn shop_page(products: &[String], pagination: &str) -> String {
        format!(
            r#"<html><body>
                <ul class="products">{}</ul>
                <nav class="woocommerce-pagination">{}</nav>
            </body></html>"#,
            products.join("\n"),
            pagination
        )
    }

    const PAGINATION: &str = r#"
        <ul class="page-numbers">
            <li><span aria-current="page" class="page-numbers current">1</span></li>
            <li><a class="page-numbers" href="https://www.wine-selection.com/shop/page/2/">2</a></li>
            <li><a class="page-numbers" href="/shop/page/3/">3</a></li>
            <li><a class="next page-numbers" href="https://www.wine-selection.com/shop/page/2/">→</a></li>
        </ul>"#;

    fn page(url: &str, html: String) -> Page {
        Page {
            url: url.to_string(),
            html,
        }
    }

    fn split(outputs: Vec<SpiderOutput>) -> (Vec<DocumentItem>, Vec<Request>) {
        let mut items = Vec::new();
        let mut requests = Vec::new();
        for output in outputs {
            match output {
                SpiderOutput::Item(item) => items.push(item),
                SpiderOutput::Request(request) => requests.push(request),
            }
        }
        (items, requests)
    }

    #[test]
    fn test_listing_yields_items_and_pagination() {
        let spider = spider();
        let html = shop_page(
            &[
                product("Chablis 2019", "18.50", "https://www.wine-selection.com/product/chablis/"),
                product("Barolo 2016", "42.00", "https://www.wine-selection.com/product/barolo/"),
            ],
            PAGINATION,
        );

        let (items, requests) = split(spider.parse(Callback::Listing, &page(LISTING_URL, html)));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].field("name"), Some("Chablis 2019"));
        assert_eq!(items[0].field("price"), Some("18.50"));
        assert_eq!(
            items[0].field("link"),
            Some("https://www.wine-selection.com/product/chablis/")
        );
        assert_eq!(items[1].field("name"), Some("Barolo 2016"));

        for item in &items {
            assert_eq!(item.url(), LISTING_URL);
            assert_eq!(item.scraper(), "extract");
            assert_eq!(item.version(), "5");
            assert!(Uuid::parse_str(item.id()).is_ok());
        }

        // The current-page entry has no link; the duplicate "next" link is kept
        let urls: Vec<_> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.wine-selection.com/shop/page/2/",
                "https://www.wine-selection.com/shop/page/3/",
                "https://www.wine-selection.com/shop/page/2/",
            ]
        );
        assert!(requests.iter().all(|r| r.callback == Callback::Page));
    }

    #[test]
    fn test_page_callback_does_not_paginate() {
        let spider = spider();
        let html = shop_page(&[product("Rioja", "12.00", "/product/rioja/")], PAGINATION);

        let (items, requests) = split(spider.parse(
            Callback::Page,
            &page("https://www.wine-selection.com/shop/page/2/", html),
        ));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url(), "https://www.wine-selection.com/shop/page/2/");
        // Product links are passed through unresolved
        assert_eq!(items[0].field("link"), Some("/product/rioja/"));
        assert!(requests.is_empty());
    }

    #[test]
    fn test_page_without_products_yields_only_requests() {
        let spider = spider();
        let html = shop_page(&[], PAGINATION);

        let (items, requests) = split(spider.parse(Callback::Listing, &page(LISTING_URL, html)));

        assert!(items.is_empty());
        assert_eq!(requests.len(), 3);
    }

    #[test]
    fn test_missing_fields_are_none() {
        let spider = spider();
        let html = shop_page(&[r#"<li class="product"><p>Sold out</p></li>"#.to_string()], "");

        let (items, requests) = split(spider.parse(Callback::Listing, &page(LISTING_URL, html)));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data().len(), 3);
        assert!(items[0].data().values().all(Option::is_none));
        assert!(requests.is_empty());
    }

    #[test]
    fn test_random_ids_differ_between_scrapes() {
        let spider = spider();
        let html = shop_page(&[product("Chablis", "18.50", "/product/chablis/")], "");

        let (first, _) = split(spider.parse(Callback::Page, &page(LISTING_URL, html.clone())));
        let (second, _) = split(spider.parse(Callback::Page, &page(LISTING_URL, html)));

        assert_ne!(first[0].id(), second[0].id());
    }

    #[test]
    fn test_deterministic_ids_are_stable() {
        let spider = spider().with_id_strategy(IdStrategy::Deterministic);
        let html = shop_page(
            &[product(
                "Chablis",
                "18.50",
                "https://www.wine-selection.com/shop/chablis-premier-cru/",
            )],
            "",
        );

        let (first, _) = split(spider.parse(Callback::Page, &page(LISTING_URL, html.clone())));
        let (second, _) = split(spider.parse(Callback::Page, &page(LISTING_URL, html)));

        assert_eq!(first[0].id(), second[0].id());
        assert_eq!(first[0].id(), "867ba12a-df7d-5eb7-6647-62017bfb4a1e");
    }

    #[test]
    fn test_deterministic_id_falls_back_to_page_and_name() {
        let spider = spider().with_id_strategy(IdStrategy::Deterministic);
        let html = shop_page(
            &[r#"<li class="product">
                <h2 class="woocommerce-loop-product_title"><span class="woocommerce-LoopProduct-link">x</span></h2>
            </li>"#
                .to_string()],
            "",
        );
        let page_url = "https://www.wine-selection.com/shop/page/2/";

        let data: ItemData = [
            ("link".to_string(), None),
            ("name".to_string(), Some("Chablis".to_string())),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            spider.assign_id(page_url, &data),
            "e7b64123-a525-c14d-48bf-6dc34c7461ce"
        );

        // No link and no name: nothing to key on
        let (items, _) = split(spider.parse(Callback::Page, &page(page_url, html)));
        assert!(Uuid::parse_str(items[0].id()).is_ok());
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://www.wine-selection.com/shop/").unwrap();
        assert_eq!(
            resolve_link(Some(&base), "page/2/"),
            Some("https://www.wine-selection.com/shop/page/2/".to_string())
        );
        assert_eq!(resolve_link(Some(&base), "#top"), None);
        assert_eq!(resolve_link(Some(&base), ""), None);
        assert_eq!(resolve_link(Some(&base), "javascript:void(0)"), None);
        assert_eq!(resolve_link(None, "/shop/page/2/"), None);
    }
}
