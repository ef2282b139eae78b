//! In-memory mock backend for tests and model-less environments.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::registry::{CorpusId, CorpusSource};
use crate::store::model::{ScoredVerse, Verse};
use crate::store::{SearchBackend, SearchSession, StoreError};

#[derive(Default)]
struct MockCorpus {
    verses: HashMap<i32, Verse>,
    embeddings: HashMap<i32, Vec<f32>>,
}

#[derive(Default)]
struct MockInner {
    corpora: RwLock<HashMap<String, MockCorpus>>,
    fail_listing: AtomicBool,
    fail_search: AtomicBool,
    fail_connection: AtomicBool,
    sessions_opened: AtomicUsize,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

/// Clonable in-memory stand-in for [`PgSearchBackend`](super::PgSearchBackend).
///
/// Tracks how many sessions were opened and how many statements ran, and can
/// be toggled into listing/search/connection failure modes.
#[derive(Clone, Default)]
pub struct MockSearchBackend {
    inner: Arc<MockInner>,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty corpus.
    pub fn add_corpus(&self, name: &str) {
        self.inner
            .corpora
            .write()
            .entry(name.to_string())
            .or_default();
    }

    /// Inserts a verse and its embedding into `corpus` (created if missing).
    pub fn insert_verse(&self, corpus: &str, verse: Verse, embedding: Vec<f32>) {
        let mut corpora = self.inner.corpora.write();
        let entry = corpora.entry(corpus.to_string()).or_default();
        entry.embeddings.insert(verse.id, embedding);
        entry.verses.insert(verse.id, verse);
    }

    /// Inserts an embedding without a matching verse row (hydration-miss
    /// scenarios).
    pub fn insert_orphan_embedding(&self, corpus: &str, verse_id: i32, embedding: Vec<f32>) {
        self.inner
            .corpora
            .write()
            .entry(corpus.to_string())
            .or_default()
            .embeddings
            .insert(verse_id, embedding);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.inner.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.inner.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_connection(&self, fail: bool) {
        self.inner.fail_connection.store(fail, Ordering::SeqCst);
    }

    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.inner.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    type Session = MockSearchSession;

    async fn session(&self) -> Result<MockSearchSession, StoreError> {
        if self.inner.fail_connection.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                message: "mock connection refused".to_string(),
            });
        }

        self.inner.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockSearchSession {
            inner: self.inner.clone(),
        })
    }
}

#[async_trait]
impl CorpusSource for MockSearchBackend {
    async fn list_corpora(&self, allowed: &[&str]) -> Result<Vec<String>, StoreError> {
        if self.inner.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                message: "mock listing unavailable".to_string(),
            });
        }

        let mut names: Vec<String> = self
            .inner
            .corpora
            .read()
            .keys()
            .filter(|name| allowed.contains(&name.as_str()))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Session over [`MockSearchBackend`] state.
pub struct MockSearchSession {
    inner: Arc<MockInner>,
}

#[async_trait]
impl SearchSession for MockSearchSession {
    async fn nearest(
        &mut self,
        corpus: &CorpusId,
        query: &[f32],
        threshold: f64,
        limit: u16,
    ) -> Result<Vec<ScoredVerse>, StoreError> {
        self.inner.search_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_connection.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                message: "mock connection lost".to_string(),
            });
        }
        if self.inner.fail_search.load(Ordering::SeqCst) {
            return Err(StoreError::Query {
                message: "mock search failure".to_string(),
            });
        }

        let corpora = self.inner.corpora.read();
        let data = corpora.get(corpus.as_str()).ok_or_else(|| StoreError::Query {
            message: format!("unknown corpus schema: {}", corpus),
        })?;

        let mut hits: Vec<ScoredVerse> = data
            .embeddings
            .iter()
            .map(|(&verse_id, stored)| ScoredVerse {
                verse_id,
                score: cosine_similarity(query, stored),
            })
            .filter(|hit| hit.score >= threshold)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.verse_id.cmp(&b.verse_id))
        });
        hits.truncate(limit as usize);

        Ok(hits)
    }

    async fn fetch_verses(
        &mut self,
        corpus: &CorpusId,
        ids: &[i32],
    ) -> Result<Vec<Verse>, StoreError> {
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_connection.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                message: "mock connection lost".to_string(),
            });
        }

        let corpora = self.inner.corpora.read();
        let data = corpora.get(corpus.as_str()).ok_or_else(|| StoreError::Query {
            message: format!("unknown corpus schema: {}", corpus),
        })?;

        // Rows come back id-descending, deliberately unlike the rank order,
        // so hydration re-ordering is exercised.
        let mut rows: Vec<Verse> = ids
            .iter()
            .filter_map(|id| data.verses.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(rows)
    }
}

/// Cosine similarity between two vectors (0.0 on mismatch or zero norm).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x * y) as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (x * x) as f64).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (x * x) as f64).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
