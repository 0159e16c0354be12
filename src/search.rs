//! Search client wrapping the Google Custom Search API.
//!
//! A search call never fails outward: API errors and empty result sets
//! both come back as an empty candidate list so the aggregator can move
//! on to alternate queries.

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ScoutConfig;
use crate::error::{ScoutError, SearchApiError};
use crate::fallback::{self, TopicCategory, UNDER_EYE_RETRY_QUERIES};

/// Path shapes that indicate a single product's page rather than a
/// listing, category or search page.
const PRODUCT_PATH_MARKERS: &[&str] = &["/p-", "-p-", "/urun/", "/product/"];

/// True when the URL's shape addresses a single product detail page.
pub fn is_product_detail_url(url: &str) -> bool {
    PRODUCT_PATH_MARKERS.iter().any(|marker| url.contains(marker))
}

pub(crate) struct SearchClient {
    client: wreq::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    site_domain: String,
}

impl SearchClient {
    pub fn new(
        config: &ScoutConfig,
        api_key: String,
        engine_id: String,
        timeout: Duration,
    ) -> Result<Self, ScoutError> {
        let client = wreq::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScoutError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.search_endpoint.clone(),
            api_key,
            engine_id,
            site_domain: config.site_domain.clone(),
        })
    }

    /// Candidate product-detail URLs for a topic, deduplicated and
    /// shuffled. Empty on API failure or when nothing matched.
    pub async fn search(&self, query: &str, hint: usize, rng: &mut StdRng) -> Vec<String> {
        let num = result_window(hint);
        let site_query = format!("{query} site:{}", self.site_domain);

        let body = match self.request(&site_query, num).await {
            Ok(body) => body,
            Err(e) => {
                warn!(query, error = %e, "search API call failed");
                return Vec::new();
            }
        };

        let links = match candidate_links(&body, &self.site_domain) {
            Some(links) => links,
            None => {
                debug!(query, "no search results");
                // The under-eye topic is chronically short on direct
                // hits; one rephrased attempt before giving up.
                match self.under_eye_retry(query, num, rng).await {
                    Some(links) => links,
                    None => return Vec::new(),
                }
            }
        };

        dedupe_and_shuffle(links, rng)
    }

    async fn under_eye_retry(
        &self,
        query: &str,
        num: usize,
        rng: &mut StdRng,
    ) -> Option<Vec<String>> {
        if fallback::category_for(query) != Some(TopicCategory::UnderEye) {
            return None;
        }
        let alt = UNDER_EYE_RETRY_QUERIES.choose(rng)?;
        let alt_query = format!("{alt} site:{}", self.site_domain);
        debug!(alt_query, "retrying under-eye topic with alternate phrasing");
        let body = match self.request(&alt_query, num).await {
            Ok(body) => body,
            Err(e) => {
                warn!(alt_query, error = %e, "alternate search call failed");
                return None;
            }
        };
        candidate_links(&body, &self.site_domain)
    }

    async fn request(&self, query: &str, num: usize) -> Result<Value, SearchApiError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| SearchApiError::Malformed(format!("bad endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", query)
            .append_pair("num", &num.to_string());

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SearchApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(SearchApiError::Status(status.as_u16()));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| SearchApiError::Malformed(e.to_string()))
    }
}

/// Over-request relative to the target count; the API caps `num` at 10.
fn result_window(hint: usize) -> usize {
    hint.saturating_mul(5).min(10)
}

/// Pull product-detail links out of a search response body.
///
/// `None` when the response carries no `items` array at all, which the
/// caller distinguishes from "items present but none usable".
fn candidate_links(body: &Value, site_domain: &str) -> Option<Vec<String>> {
    let items = body.get("items")?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.get("link").and_then(Value::as_str))
            .filter(|link| link.contains(site_domain) && is_product_detail_url(link))
            .map(str::to_string)
            .collect(),
    )
}

fn dedupe_and_shuffle(links: Vec<String>, rng: &mut StdRng) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = links.into_iter().filter(|l| seen.insert(l.clone())).collect();
    unique.shuffle(rng);
    unique
}
