use serde::{Deserialize, Serialize};

/// One extracted product candidate.
///
/// Every field except `purchase_link` is optional: extraction keeps
/// whatever the page yielded and leaves the rest unset. An absent field
/// is always `None`, never an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// The URL that was fetched to produce this record. Never derived
    /// from page content.
    pub purchase_link: String,
    pub name: Option<String>,
    /// Digits, commas and periods only; currency symbols stripped.
    pub price: Option<String>,
    pub rating: Option<f64>,
    /// Absolute URL; protocol-relative sources are resolved to `https:`.
    pub image_url: Option<String>,
    pub brand: Option<String>,
}

impl Product {
    pub(crate) fn empty(purchase_link: &str) -> Self {
        Self {
            purchase_link: purchase_link.to_string(),
            name: None,
            price: None,
            rating: None,
            image_url: None,
            brand: None,
        }
    }
}
