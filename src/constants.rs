//! Cross-cutting, shared constants.
//!
//! Request bounds mirror what the public API documents; the embedding
//! dimension is fixed by the model family and treated as an invariant by the
//! embedding and store modules.

/// Output dimension of the mpnet-class sentence embedding model.
pub const EMBEDDING_DIM: usize = 768;

/// Maximum tokens fed to the encoder; longer inputs are truncated.
pub const MAX_SEQ_LEN: usize = 384;

/// Similarity threshold applied when a request does not specify one.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Inclusive threshold bounds accepted by the API.
pub const MIN_THRESHOLD: f64 = 0.0;
pub const MAX_THRESHOLD: f64 = 1.0;

/// Result cap applied when a request does not specify one.
pub const DEFAULT_MAX_RESULTS: u16 = 10;

/// Inclusive result-cap bounds accepted by the API.
pub const MIN_MAX_RESULTS: u16 = 1;
pub const MAX_MAX_RESULTS: u16 = 100;

/// Corpus used when a request does not name one.
pub const DEFAULT_CORPUS: &str = "kjv";
