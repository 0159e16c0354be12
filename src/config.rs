//! Pipeline configuration.

/// Configuration for a [`crate::ProductScout`] instance.
///
/// `api_key` and `engine_id` address the Google Custom Search API; they
/// can be set explicitly or picked up from `GOOGLE_SEARCH_API_KEY` /
/// `GOOGLE_SEARCH_ENGINE_ID` via [`ScoutConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Search API key. Required to construct a pipeline.
    pub api_key: Option<String>,
    /// Search engine id (`cx` parameter). Required to construct a pipeline.
    pub engine_id: Option<String>,
    /// Target site; search results whose link does not contain this
    /// domain are discarded.
    pub site_domain: String,
    /// Search API endpoint. Overridable for tests.
    pub search_endpoint: String,
    /// Per-request timeout, applied to both page fetches and search calls.
    pub timeout_secs: u64,
    /// Seed for candidate shuffling and alternate-query choice. `None`
    /// seeds from entropy; set it to make a run reproducible.
    pub rng_seed: Option<u64>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            site_domain: "trendyol.com".to_string(),
            search_endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            timeout_secs: 10,
            rng_seed: None,
        }
    }
}

impl ScoutConfig {
    /// Default config with credentials read from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: env_var("GOOGLE_SEARCH_API_KEY"),
            engine_id: env_var("GOOGLE_SEARCH_ENGINE_ID"),
            ..Self::default()
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
