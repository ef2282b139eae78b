use std::sync::Arc;

use crate::embedding::MpnetEmbedder;
use crate::registry::CorpusRegistry;
use crate::store::SearchBackend;

/// Shared handler state: the encoder, the corpus registry and the store
/// backend (which owns the connection pool).
#[derive(Clone)]
pub struct HandlerState<B: SearchBackend + Clone + Send + Sync + 'static> {
    pub embedder: Arc<MpnetEmbedder>,

    pub registry: Arc<CorpusRegistry>,

    pub backend: B,
}

impl<B> HandlerState<B>
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    pub fn new(embedder: Arc<MpnetEmbedder>, registry: Arc<CorpusRegistry>, backend: B) -> Self {
        Self {
            embedder,
            registry,
            backend,
        }
    }
}
