//! Field extraction from a single product page.
//!
//! Trendyol changes its markup often, so every field is resolved
//! through an ordered cascade of known selector variants: the first
//! selector yielding non-empty text wins, with no merging across
//! selectors. Fields the cascade leaves unset are filled from the
//! page's `application/ld+json` block when one is present. Extraction
//! never fails; a page that yields nothing still produces a record
//! carrying the source URL.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;

use crate::product::Product;

const NAME_SELECTORS: &[&str] = &[
    ".pr-new-br",
    ".prdct-desc-cntnr-name",
    "h1.pr-new-br",
    ".product-name",
    ".product-detail-name",
];

const PRICE_SELECTORS: &[&str] = &[
    ".prc-dsc",
    ".product-price",
    ".price-container",
    ".pr-bx-w .prc-dsc",
    ".pr-bx-nm .prc-dsc",
    ".pr-bx-w .prc-org",
    "[data-testid='price-current-price']",
    ".product-price-container .prc-dsc",
];

const RATING_SELECTORS: &[&str] = &[
    ".tltp-avg",
    ".rating-score",
    ".star-w .rt",
    "[data-testid='rating-score']",
];

const IMAGE_SELECTORS: &[&str] = &[
    ".product-slide img",
    ".gallery-modal-content img",
    ".base-product-image",
    ".product-img",
    "[data-testid='product-image']",
    ".ph-gl-img",
];

const BRAND_SELECTORS: &[&str] = &[
    ".pr-new-br",
    ".prdct-desc-cntnr-ttl",
    ".product-brand",
    ".brand-name",
];

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"\d+\.\d+|\d+").unwrap();
}

/// Extract whatever product fields the page yields.
///
/// `purchase_link` is always `source_url`, independent of page content.
pub(crate) fn extract_fields(html: &str, source_url: &str) -> Product {
    let mut product = Product::empty(source_url);
    let document = Html::parse_document(html);

    product.name = first_text(&document, NAME_SELECTORS);
    product.price = first_text(&document, PRICE_SELECTORS).map(|t| sanitize_price(&t));
    product.rating = first_rating(&document);
    product.image_url = first_image(&document);
    product.brand = first_text(&document, BRAND_SELECTORS);

    // The first word of the product name is usually the brand.
    if product.brand.is_none() {
        if let Some(name) = &product.name {
            product.brand = infer_brand(name);
        }
    }

    apply_json_ld(&document, &mut product);

    product
}

/// First selector in the cascade whose element has non-empty text.
fn first_text(document: &Html, cascade: &[&str]) -> Option<String> {
    for selector in cascade {
        let sel = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(elem) = document.select(&sel).next() {
            let text = elem.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Keep only digits, commas and periods; everything else (currency
/// symbols, "TL", whitespace) is stripped.
fn sanitize_price(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect()
}

/// First selector whose text actually parses to a number wins; an
/// element with unusable text does not stop the cascade.
fn first_rating(document: &Html) -> Option<f64> {
    for selector in RATING_SELECTORS {
        let sel = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(elem) = document.select(&sel).next() {
            let text = elem.text().collect::<String>();
            if let Some(rating) = parse_rating(&text) {
                return Some(rating);
            }
        }
    }
    None
}

/// Normalize the decimal comma, then parse the first numeric substring.
fn parse_rating(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    NUMBER_RE
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn first_image(document: &Html) -> Option<String> {
    for selector in IMAGE_SELECTORS {
        let sel = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(img) = document.select(&sel).next() {
            if let Some(src) = img.value().attr("src") {
                if !src.is_empty() {
                    return Some(fix_protocol_relative(src));
                }
            }
        }
    }
    None
}

fn fix_protocol_relative(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    }
}

fn infer_brand(name: &str) -> Option<String> {
    let first_word = name.split_whitespace().next()?;
    if first_word.chars().count() > 2 {
        Some(first_word.to_string())
    } else {
        None
    }
}

/// Fill still-unset fields from the page's first JSON-LD block.
///
/// Parse errors are logged and swallowed; fields already resolved by
/// the selector cascade are never overwritten.
fn apply_json_ld(document: &Html, product: &mut Product) {
    let sel = match Selector::parse("script[type='application/ld+json']") {
        Ok(s) => s,
        Err(_) => return,
    };
    let script = match document.select(&sel).next() {
        Some(s) => s,
        None => return,
    };

    let text = script.text().collect::<String>();
    let data: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!(url = %product.purchase_link, error = %e, "JSON-LD parsing error");
            return;
        }
    };

    if product.name.is_none() {
        if let Some(name) = data.get("name").and_then(Value::as_str) {
            product.name = Some(name.to_string());
        }
    }
    if product.price.is_none() {
        if let Some(price) = data.get("offers").and_then(|o| o.get("price")) {
            product.price = Some(stringify(price));
        }
    }
    if product.rating.is_none() {
        if let Some(value) = data.get("aggregateRating").and_then(|r| r.get("ratingValue")) {
            product.rating = as_float(value);
            if product.rating.is_none() {
                warn!(url = %product.purchase_link, "JSON-LD ratingValue is not numeric");
            }
        }
    }
    if product.image_url.is_none() {
        product.image_url = match data.get("image") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(String::from),
            _ => None,
        };
    }
    if product.brand.is_none() {
        if let Some(brand) = data
            .get("brand")
            .and_then(|b| b.get("name"))
            .and_then(Value::as_str)
        {
            product.brand = Some(brand.to_string());
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.trendyol.com/marka/serum-p-123";

    fn page(body: &str) -> String {
        format!("<html><head></head><body>{body}</body></html>")
    }

    #[test]
    fn purchase_link_always_set() {
        let product = extract_fields("", URL);
        assert_eq!(product.purchase_link, URL);
        assert!(product.name.is_none());
    }

    #[test]
    fn earlier_selector_wins() {
        let html = page(
            r#"<h1 class="pr-new-br">First Name</h1>
               <div class="product-name">Second Name</div>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.name.as_deref(), Some("First Name"));
    }

    #[test]
    fn empty_element_does_not_stop_the_cascade() {
        let html = page(
            r#"<h1 class="pr-new-br">  </h1>
               <div class="product-name">Fallback Name</div>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.name.as_deref(), Some("Fallback Name"));
    }

    #[test]
    fn price_keeps_digits_commas_periods() {
        assert_eq!(sanitize_price("1.299,90 TL"), "1.299,90");
        assert_eq!(sanitize_price("₺49,99"), "49,99");
        let html = page(r#"<span class="prc-dsc">1.299,90 TL</span>"#);
        let product = extract_fields(&html, URL);
        assert_eq!(product.price.as_deref(), Some("1.299,90"));
    }

    #[test]
    fn rating_parses_comma_decimal() {
        assert_eq!(parse_rating("4,5 / 5"), Some(4.5));
        assert_eq!(parse_rating("4.8"), Some(4.8));
        assert_eq!(parse_rating("5"), Some(5.0));
        assert_eq!(parse_rating("no score"), None);
    }

    #[test]
    fn unparseable_rating_falls_through_to_next_selector() {
        let html = page(
            r#"<div class="tltp-avg">çok iyi</div>
               <div class="rating-score">4,2</div>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.rating, Some(4.2));
    }

    #[test]
    fn protocol_relative_image_resolved_to_https() {
        let html = page(r#"<img class="base-product-image" src="//cdn.site.com/a.jpg">"#);
        let product = extract_fields(&html, URL);
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://cdn.site.com/a.jpg")
        );
    }

    #[test]
    fn brand_inferred_from_name_first_word() {
        assert_eq!(infer_brand("Bioderma Sebium Gel"), Some("Bioderma".into()));
        // Two characters or fewer is too short to be a brand.
        assert_eq!(infer_brand("La Roche-Posay Effaclar"), None);
    }

    #[test]
    fn explicit_brand_selector_beats_inference() {
        let html = page(
            r#"<div class="product-name">Bioderma Sebium Gel</div>
               <div class="brand-name">Bioderma Laboratoire</div>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.brand.as_deref(), Some("Bioderma Laboratoire"));
    }

    #[test]
    fn json_ld_fills_unset_fields_only() {
        let html = page(
            r#"<div class="product-name">Cascade Name</div>
               <script type="application/ld+json">
               {"@type":"Product","name":"LD Name",
                "offers":{"price":199.9},
                "aggregateRating":{"ratingValue":"4.7"},
                "image":"https://cdn.site.com/ld.jpg",
                "brand":{"name":"LD Brand"}}
               </script>"#,
        );
        let product = extract_fields(&html, URL);
        // Already resolved by the cascade: JSON-LD must not overwrite.
        assert_eq!(product.name.as_deref(), Some("Cascade Name"));
        // Inferred brand counts as resolved too.
        assert_eq!(product.brand.as_deref(), Some("Cascade"));
        // Unset fields are filled.
        assert_eq!(product.price.as_deref(), Some("199.9"));
        assert_eq!(product.rating, Some(4.7));
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.site.com/ld.jpg"));
    }

    #[test]
    fn json_ld_image_array_takes_first_entry() {
        let html = page(
            r#"<script type="application/ld+json">
               {"name":"X","image":["https://cdn.site.com/1.jpg","https://cdn.site.com/2.jpg"]}
               </script>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.site.com/1.jpg"));
    }

    #[test]
    fn malformed_json_ld_keeps_cascade_fields() {
        let html = page(
            r#"<h1 class="pr-new-br">Kept Name</h1>
               <script type="application/ld+json">{not json</script>"#,
        );
        let product = extract_fields(&html, URL);
        assert_eq!(product.name.as_deref(), Some("Kept Name"));
        assert!(product.price.is_none());
    }
}
