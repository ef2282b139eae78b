//! Verse-search library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`MpnetEmbedder`], [`EmbedderConfig`] - Query embedding
//! - [`CorpusRegistry`], [`CorpusId`], [`CorpusSource`] - Corpus namespaces
//! - [`PgSearchBackend`], [`SearchBackend`], [`SearchSession`] - Verse store
//! - [`run_search`], [`SearchParams`], [`SearchError`] - The query pipeline
//! - [`gateway`] - HTTP/WebSocket transports
//!
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod registry;
pub mod search;
pub mod store;

pub use config::{Config, ConfigError};
pub use constants::{
    DEFAULT_CORPUS, DEFAULT_MAX_RESULTS, DEFAULT_THRESHOLD, EMBEDDING_DIM, MAX_MAX_RESULTS,
    MAX_SEQ_LEN, MAX_THRESHOLD, MIN_MAX_RESULTS, MIN_THRESHOLD,
};
pub use embedding::{EmbedderConfig, EmbeddingError, MpnetEmbedder};
pub use gateway::{HandlerState, create_router_with_state};
pub use registry::{
    CORPUS_CACHE_TTL, CorpusId, CorpusRegistry, CorpusSource, DEFAULT_CORPORA, KNOWN_CORPORA,
    is_valid_corpus_token,
};
pub use search::{SearchError, SearchParams, run_search};
#[cfg(any(test, feature = "mock"))]
pub use store::{MockSearchBackend, MockSearchSession};
pub use store::{
    PgSearchBackend, PgSearchSession, ScoredVerse, SearchBackend, SearchSession, StoreError, Verse,
    VerseRecord,
};
