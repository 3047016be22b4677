// src/spider/selectors.rs
// =============================================================================
// This module holds the CSS selectors the spider uses.
//
// Selectors live in a plain config struct so a shop redesign can be handled
// with a JSON file instead of a rebuild:
//
//   {
//     "product": "li.product",
//     "fields": {
//       "name":  { "css": "h2 a" },
//       "price": { "css": "span.price bdi" },
//       "link":  { "css": "a", "attr": "href" }
//     }
//   }
//
// Missing keys fall back to the defaults below.
//
// A field lookup either reads an attribute (when `attr` is set) or the first
// text node directly inside the matched element. A lookup that matches
// nothing gives None, never an error.
//
// Rust concepts:
// - #[serde(default)]: fill missing JSON keys from Default
// - Compile once, use many times: Selector::parse is done up front
// =============================================================================

use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How to read one value out of a product element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    /// CSS selector, evaluated inside the enclosing element
    pub css: String,
    /// Attribute to read; when absent the element's own text is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl FieldSelector {
    pub fn text(css: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: None,
        }
    }

    pub fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: Some(attr.to_string()),
        }
    }
}

// Selector configuration for a WooCommerce product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One match per product on the page
    pub product: String,
    /// Data fields extracted from each product, by output key
    pub fields: BTreeMap<String, FieldSelector>,
    /// One match per pagination control
    pub pagination_item: String,
    /// Link inside a pagination control
    pub pagination_link: FieldSelector,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "name".to_string(),
            FieldSelector::text(
                "h2.woocommerce-loop-product_title a.woocommerce-LoopProduct-link",
            ),
        );
        fields.insert(
            "price".to_string(),
            FieldSelector::text("span.woocommerce-Price-amount > bdi"),
        );
        fields.insert("link".to_string(), FieldSelector::attr("a", "href"));

        Self {
            product: "li.product".to_string(),
            fields,
            pagination_item: "ul.page-numbers li".to_string(),
            pagination_link: FieldSelector::attr("a.page-numbers", "href"),
        }
    }
}

impl SelectorConfig {
    // Loads a selector config from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selector file {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid selector file {}", path.display()))
    }

    // Parses every CSS string, failing on the first invalid one
    pub(crate) fn compile(&self) -> Result<CompiledSelectors> {
        let fields = self
            .fields
            .iter()
            .map(|(key, field)| -> Result<(String, CompiledField)> {
                Ok((key.clone(), CompiledField::compile(field)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledSelectors {
            product: parse_selector(&self.product)?,
            fields,
            pagination_item: parse_selector(&self.pagination_item)?,
            pagination_link: CompiledField::compile(&self.pagination_link)?,
        })
    }
}

/// Parsed selectors, ready to run against documents
#[derive(Debug)]
pub(crate) struct CompiledSelectors {
    pub(crate) product: Selector,
    pub(crate) fields: Vec<(String, CompiledField)>,
    pub(crate) pagination_item: Selector,
    pub(crate) pagination_link: CompiledField,
}

#[derive(Debug)]
pub(crate) struct CompiledField {
    selector: Selector,
    attr: Option<String>,
}

impl CompiledField {
    fn compile(field: &FieldSelector) -> Result<Self> {
        Ok(Self {
            selector: parse_selector(&field.css)?,
            attr: field.attr.clone(),
        })
    }

    // Runs the lookup inside `scope`
    //
    // The first matching element that has the attribute (or a direct text
    // node) wins, in document order.
    pub(crate) fn extract(&self, scope: ElementRef<'_>) -> Option<String> {
        let mut matches = scope.select(&self.selector);

        match &self.attr {
            Some(attr) => {
                matches.find_map(|element| element.value().attr(attr).map(str::to_string))
            }
            None => matches.find_map(first_direct_text),
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {}", css, e))
}

// First text node that is a direct child of the element
//
// Text inside nested elements is ignored, so for
//   <bdi><span>€</span>18.50</bdi>
// this returns "18.50".
fn first_direct_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .find_map(|node| node.value().as_text().map(|text| String::from(&**text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn fragment(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn test_default_config_compiles() {
        let compiled = SelectorConfig::default().compile().unwrap();
        let keys: Vec<_> = compiled.fields.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["link", "name", "price"]);
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let config = SelectorConfig {
            product: "li[".to_string(),
            ..SelectorConfig::default()
        };
        let err = config.compile().unwrap_err();
        assert!(err.to_string().contains("li["));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{ "product": "div.card" }"#).unwrap();
        assert_eq!(config.product, "div.card");
        assert_eq!(config.pagination_item, "ul.page-numbers li");
        assert_eq!(config.fields.len(), 3);
    }

    #[test]
    fn test_text_lookup_reads_direct_text_only() {
        let doc = fragment(
            r#"<span class="woocommerce-Price-amount"><bdi><span>€</span>18.50</bdi></span>"#,
        );
        let field =
            CompiledField::compile(&FieldSelector::text("span.woocommerce-Price-amount > bdi"))
                .unwrap();
        assert_eq!(field.extract(doc.root_element()), Some("18.50".to_string()));
    }

    #[test]
    fn test_attr_lookup_skips_elements_without_attr() {
        let doc = fragment(r#"<a name="top">Top</a><a href="/wine/1">Wine</a>"#);
        let field = CompiledField::compile(&FieldSelector::attr("a", "href")).unwrap();
        assert_eq!(field.extract(doc.root_element()), Some("/wine/1".to_string()));
    }

    #[test]
    fn test_lookup_without_match_is_none() {
        let doc = fragment(r#"<p>No price here</p>"#);
        let field = CompiledField::compile(&FieldSelector::text("bdi")).unwrap();
        assert_eq!(field.extract(doc.root_element()), None);
    }
}
