//! The semantic query pipeline.
//!
//! Both transports run the same sequence: validate bounds, resolve the
//! corpus, short-circuit empty queries, encode, rank, hydrate. The caller
//! supplies the store session, so the stateless endpoint can use a
//! per-request checkout and the WebSocket endpoint its long-lived one.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::constants::{
    MAX_MAX_RESULTS, MAX_THRESHOLD, MIN_MAX_RESULTS, MIN_THRESHOLD,
};
use crate::embedding::{EmbeddingError, MpnetEmbedder};
use crate::registry::CorpusRegistry;
use crate::store::{SearchSession, StoreError, Verse};

/// Validated-on-entry search parameters, one per request or session message.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub threshold: f64,
    pub corpus: String,
    pub max_results: u16,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid threshold {0}: must lie in [0, 1]")]
    InvalidThreshold(f64),

    #[error("invalid max_results {0}: must lie in [1, 100]")]
    InvalidLimit(u16),

    #[error("invalid bible version: {0}")]
    UnknownCorpus(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SearchError {
    /// Returns `true` for caller mistakes (as opposed to service failures).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidThreshold(_)
                | SearchError::InvalidLimit(_)
                | SearchError::UnknownCorpus(_)
        )
    }
}

/// Runs the full pipeline for one request over `session`.
///
/// Corpus validation happens before any vector computation, and an empty or
/// whitespace-only query returns an empty result without touching the
/// encoder or the store.
pub async fn run_search<S: SearchSession>(
    embedder: &MpnetEmbedder,
    registry: &CorpusRegistry,
    session: &mut S,
    params: &SearchParams,
) -> Result<Vec<Verse>, SearchError> {
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&params.threshold) {
        return Err(SearchError::InvalidThreshold(params.threshold));
    }

    if !(MIN_MAX_RESULTS..=MAX_MAX_RESULTS).contains(&params.max_results) {
        return Err(SearchError::InvalidLimit(params.max_results));
    }

    let corpus = registry
        .resolve(&params.corpus)
        .await
        .ok_or_else(|| SearchError::UnknownCorpus(params.corpus.clone()))?;

    let query = params.query.trim();
    if query.is_empty() {
        debug!("Empty query, returning no results");
        return Ok(Vec::new());
    }

    let vector = embedder.embed(query)?;

    let hits = session
        .nearest(&corpus, &vector, params.threshold, params.max_results)
        .await?;

    debug!(
        corpus = %corpus,
        hits = hits.len(),
        threshold = params.threshold,
        "Pipeline ranked candidates"
    );

    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = hits.iter().map(|hit| hit.verse_id).collect();
    let rows = session.fetch_verses(&corpus, &ids).await?;

    Ok(order_by_rank(&ids, rows))
}

/// Re-orders hydrated rows to the engine's rank order. Bulk fetch makes no
/// ordering promise, and ids without a row are dropped.
fn order_by_rank(ids: &[i32], mut rows: Vec<Verse>) -> Vec<Verse> {
    let rank: HashMap<i32, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    rows.retain(|verse| rank.contains_key(&verse.id));
    rows.sort_by_key(|verse| rank[&verse.id]);

    if rows.len() < ids.len() {
        debug!(
            ranked = ids.len(),
            hydrated = rows.len(),
            "Some ranked ids had no verse row"
        );
    }

    rows
}
