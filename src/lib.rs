//! Skin-care product discovery for trendyol.com.
//!
//! Given a topic (free text or a classifier label such as
//! `"black_circle"`), the pipeline looks up candidate product detail
//! pages through the Google Custom Search API, extracts a structured
//! record from each page, and returns a bounded list that is
//! deduplicated by product name, capped at two products per brand, and
//! optionally filtered by a minimum rating. When the primary query
//! under-supplies, category-specific alternate queries are tried until
//! the target count is reached or every phrasing is exhausted.
//!
//! The pipeline is sequential and never fails outward: fetch, parse,
//! and search errors are logged and the run continues, so the caller
//! always gets a (possibly short or empty) list.
//!
//! ```no_run
//! use trendyol_scout::{ProductScout, ScoutConfig};
//!
//! # async fn run() {
//! let scout = ProductScout::new(ScoutConfig::from_env()).unwrap();
//! let products = scout.search_products("akne serumu", 3, Some(4.0)).await;
//! for p in &products {
//!     println!("{:?} -> {}", p.name, p.purchase_link);
//! }
//! # }
//! ```

mod aggregator;
mod config;
mod error;
mod extract;
mod fallback;
mod fetch;
mod product;
mod search;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use aggregator::Aggregator;
use fetch::PageFetcher;
use search::SearchClient;

pub use config::ScoutConfig;
pub use error::{FetchError, ScoutError, SearchApiError};
pub use product::Product;
pub use search::is_product_detail_url;

/// The product discovery pipeline.
///
/// One instance holds the HTTP clients and configuration; each
/// `search_products` call runs with its own state, so a single scout
/// can serve concurrent lookups.
pub struct ProductScout {
    config: ScoutConfig,
    fetcher: PageFetcher,
    search: SearchClient,
}

impl std::fmt::Debug for ProductScout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductScout")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProductScout {
    /// Build a pipeline from explicit configuration.
    ///
    /// Fails when the search credentials are missing or an HTTP client
    /// cannot be constructed.
    pub fn new(config: ScoutConfig) -> Result<Self, ScoutError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ScoutError::Config("missing search API key".into()))?;
        let engine_id = config
            .engine_id
            .clone()
            .ok_or_else(|| ScoutError::Config("missing search engine id".into()))?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let fetcher = PageFetcher::new(timeout)?;
        let search = SearchClient::new(&config, api_key, engine_id, timeout)?;
        Ok(Self {
            config,
            fetcher,
            search,
        })
    }

    /// Build a pipeline with credentials from the environment.
    pub fn from_env() -> Result<Self, ScoutError> {
        Self::new(ScoutConfig::from_env())
    }

    /// Discover up to `count` products for a topic.
    ///
    /// Every returned record carries the URL it was extracted from, has
    /// a name no other returned record shares, belongs to a brand with
    /// at most one other returned product, and, when `min_rating` is
    /// given, has a rating at or above it. The list may be shorter
    /// than `count` when the search and all alternate queries are
    /// exhausted first.
    pub async fn search_products(
        &self,
        topic: &str,
        count: usize,
        min_rating: Option<f64>,
    ) -> Vec<Product> {
        let mut rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Aggregator::new(&self.fetcher, &self.search)
            .run(topic, count, min_rating, &mut rng)
            .await
    }

    /// Extract a single product record from a known detail-page URL,
    /// skipping the search step.
    ///
    /// On fetch failure the record still carries the URL with every
    /// other field unset.
    pub async fn extract_product(&self, url: &str) -> Product {
        match self.fetcher.fetch(url).await {
            Ok(html) => extract::extract_fields(&html, url),
            Err(e) => {
                warn!(url, error = %e, "could not access URL");
                Product::empty(url)
            }
        }
    }

    /// Blocking wrapper around [`search_products`](Self::search_products)
    /// for callers without a runtime. Must not be called from inside an
    /// async context.
    pub fn search_products_blocking(
        &self,
        topic: &str,
        count: usize,
        min_rating: Option<f64>,
    ) -> Result<Vec<Product>, ScoutError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ScoutError::Runtime(e.to_string()))?;
        Ok(runtime.block_on(self.search_products(topic, count, min_rating)))
    }
}
