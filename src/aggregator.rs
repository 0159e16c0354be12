//! Diversity-constrained aggregation across search rounds.
//!
//! The aggregator owns all per-run state: accepted products, the names
//! already taken, per-brand counts, and every URL examined so far.
//! Nothing here is shared between runs; concurrent lookups at a higher
//! layer each drive their own run.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::extract::extract_fields;
use crate::fallback::alternate_queries;
use crate::fetch::PageFetcher;
use crate::product::Product;
use crate::search::SearchClient;

/// How many accepted products may share one brand value.
const BRAND_CAP: usize = 2;

pub(crate) struct Aggregator<'a> {
    fetcher: &'a PageFetcher,
    search: &'a SearchClient,
}

impl<'a> Aggregator<'a> {
    pub fn new(fetcher: &'a PageFetcher, search: &'a SearchClient) -> Self {
        Self { fetcher, search }
    }

    /// Run the full discovery flow: primary search, collection, then
    /// alternate-query rounds until `count` products are accepted or
    /// every query is exhausted. The result may be shorter than
    /// `count`; that is not an error.
    pub async fn run(
        &self,
        topic: &str,
        count: usize,
        min_rating: Option<f64>,
        rng: &mut StdRng,
    ) -> Vec<Product> {
        let mut state = RunState::new();
        if count == 0 {
            return state.accepted;
        }

        let candidates = self.search.search(topic, count, rng).await;
        debug!(topic, candidates = candidates.len(), "primary search round");
        self.collect(&candidates, &mut state, count, min_rating).await;

        if state.accepted.len() < count {
            for alternate in alternate_queries(topic, rng) {
                if state.accepted.len() >= count {
                    break;
                }
                let candidates: Vec<String> = self
                    .search
                    .search(&alternate, count, rng)
                    .await
                    .into_iter()
                    .filter(|url| !state.examined.contains(url))
                    .collect();
                debug!(
                    alternate,
                    candidates = candidates.len(),
                    accepted = state.accepted.len(),
                    "alternate search round"
                );
                self.collect(&candidates, &mut state, count, min_rating).await;
            }
        }

        state.accepted.truncate(count);
        state.accepted
    }

    async fn collect(
        &self,
        candidates: &[String],
        state: &mut RunState,
        target: usize,
        min_rating: Option<f64>,
    ) {
        // Every candidate surfaced this round counts as examined, even
        // the ones skipped by an early stop; later rounds must not
        // resurface them.
        state
            .examined
            .extend(candidates.iter().cloned());

        for url in candidates {
            if state.accepted.len() >= target {
                break;
            }
            let html = match self.fetcher.fetch(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url, error = %e, "could not access URL");
                    continue;
                }
            };
            let product = extract_fields(&html, url);
            state.admit(product, min_rating);
        }
    }
}

/// Mutable state for one discovery run.
pub(crate) struct RunState {
    pub accepted: Vec<Product>,
    pub examined: HashSet<String>,
    seen_names: HashSet<String>,
    brand_counts: HashMap<String, usize>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            accepted: Vec::new(),
            examined: HashSet::new(),
            seen_names: HashSet::new(),
            brand_counts: HashMap::new(),
        }
    }

    /// Apply the acceptance policy, in order: a product must have a
    /// name, the name must be new this run, its brand must be under
    /// the cap, and it must clear the rating floor when one was asked
    /// for. Accepting records the name and bumps the brand count.
    pub fn admit(&mut self, product: Product, min_rating: Option<f64>) -> bool {
        let name = match &product.name {
            Some(name) => name.clone(),
            None => {
                debug!(url = %product.purchase_link, "rejected: no product name");
                return false;
            }
        };
        if self.seen_names.contains(&name) {
            debug!(name, "rejected: duplicate name");
            return false;
        }
        if let Some(brand) = &product.brand {
            if self.brand_counts.get(brand).copied().unwrap_or(0) >= BRAND_CAP {
                debug!(brand, "rejected: brand cap reached");
                return false;
            }
        }
        if let Some(min) = min_rating {
            if !product.rating.is_some_and(|r| r >= min) {
                debug!(name, rating = ?product.rating, "rejected: below rating floor");
                return false;
            }
        }

        self.seen_names.insert(name);
        if let Some(brand) = &product.brand {
            *self.brand_counts.entry(brand.clone()).or_insert(0) += 1;
        }
        self.accepted.push(product);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, brand: Option<&str>, rating: Option<f64>) -> Product {
        Product {
            purchase_link: format!("https://www.trendyol.com/{}-p-1", name.to_lowercase()),
            name: Some(name.to_string()),
            price: Some("199,90".to_string()),
            rating,
            image_url: None,
            brand: brand.map(String::from),
        }
    }

    #[test]
    fn nameless_product_is_never_accepted() {
        let mut state = RunState::new();
        let mut p = product("X", None, Some(4.5));
        p.name = None;
        assert!(!state.admit(p, None));
        assert!(state.accepted.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut state = RunState::new();
        assert!(state.admit(product("Serum A", None, None), None));
        assert!(!state.admit(product("Serum A", None, None), None));
        assert_eq!(state.accepted.len(), 1);
    }

    #[test]
    fn brand_cap_rejects_the_third_product() {
        let mut state = RunState::new();
        assert!(state.admit(product("Serum A", Some("Acme"), None), None));
        assert!(state.admit(product("Serum B", Some("Acme"), None), None));
        assert!(!state.admit(product("Serum C", Some("Acme"), None), None));
        // Brandless products are exempt from the cap.
        assert!(state.admit(product("Serum D", None, None), None));
        assert_eq!(state.accepted.len(), 3);
    }

    #[test]
    fn brand_cap_counts_per_brand() {
        let mut state = RunState::new();
        assert!(state.admit(product("A1", Some("Acme"), None), None));
        assert!(state.admit(product("B1", Some("Beta"), None), None));
        assert!(state.admit(product("A2", Some("Acme"), None), None));
        assert!(state.admit(product("B2", Some("Beta"), None), None));
        assert!(!state.admit(product("A3", Some("Acme"), None), None));
        assert!(!state.admit(product("B3", Some("Beta"), None), None));
    }

    #[test]
    fn rating_floor_rejects_unrated_and_low_rated() {
        let mut state = RunState::new();
        assert!(!state.admit(product("Unrated", None, None), Some(4.0)));
        assert!(!state.admit(product("Low", None, Some(3.9)), Some(4.0)));
        assert!(state.admit(product("Exact", None, Some(4.0)), Some(4.0)));
        assert!(state.admit(product("High", None, Some(4.8)), Some(4.0)));
        assert_eq!(state.accepted.len(), 2);
    }

    #[test]
    fn no_rating_floor_accepts_unrated_products() {
        let mut state = RunState::new();
        assert!(state.admit(product("Unrated", None, None), None));
    }

    #[test]
    fn policy_checks_name_before_brand_and_rating() {
        let mut state = RunState::new();
        assert!(state.admit(product("Serum A", Some("Acme"), Some(4.5)), Some(4.0)));
        // Duplicate name with a fresh brand: rejected for the name, so
        // the brand count must stay untouched.
        assert!(!state.admit(product("Serum A", Some("Beta"), Some(5.0)), Some(4.0)));
        assert_eq!(state.brand_counts.get("Beta"), None);
    }
}
