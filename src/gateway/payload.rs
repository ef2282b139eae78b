use serde::Deserialize;

use crate::constants::{DEFAULT_CORPUS, DEFAULT_MAX_RESULTS, DEFAULT_THRESHOLD};
use crate::search::SearchParams;

/// Wire shape of a search request, shared by the HTTP body and WebSocket
/// messages. Only `query` is required; the rest carry API defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_bible_version")]
    pub bible_version: String,

    #[serde(default = "default_max_results")]
    pub max_results: u16,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_bible_version() -> String {
    DEFAULT_CORPUS.to_string()
}

fn default_max_results() -> u16 {
    DEFAULT_MAX_RESULTS
}

impl From<SearchQuery> for SearchParams {
    fn from(q: SearchQuery) -> Self {
        Self {
            query: q.query,
            threshold: q.threshold,
            corpus: q.bible_version,
            max_results: q.max_results,
        }
    }
}
