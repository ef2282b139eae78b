//! Corpus registry.
//!
//! Caches the set of valid corpus namespaces (one per bible translation),
//! refreshed from the backing store on a TTL. Readers always see a complete
//! snapshot; the refresh path is serialized so concurrent callers never
//! observe a partially updated list. When the store is unreachable the
//! previous snapshot is kept, or the built-in default set at cold start.


use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::store::StoreError;

/// Corpora assumed available when the store cannot be listed at cold start.
pub const DEFAULT_CORPORA: &[&str] = &["asv", "kjv", "net", "web"];

/// Every corpus name the provisioning tooling may ever create. The registry
/// only reports names that are both in this list and present in the store.
pub const KNOWN_CORPORA: &[&str] = &[
    "asv", "esv", "kjv", "nasb", "net", "niv", "nkjv", "nlt", "web",
];

/// How long a registry snapshot stays valid before a refresh is attempted.
pub const CORPUS_CACHE_TTL: Duration = Duration::from_secs(300);

/// A corpus identifier that passed registry validation.
///
/// The inner name is private: the only way to obtain a `CorpusId` is
/// [`CorpusRegistry::resolve`], which checks both the charset and membership
/// in the current snapshot. Store code interpolates this value into
/// schema-qualified statements, so construction is the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorpusId(String);

impl CorpusId {
    /// Returns the validated schema name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(any(test, feature = "mock"))]
impl CorpusId {
    /// Constructs an id without registry validation. Test/mock builds only.
    pub fn unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for CorpusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of corpus namespace listings (the store, or a mock in tests).
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Lists the corpus namespaces present in the backing store,
    /// restricted to `allowed`.
    async fn list_corpora(&self, allowed: &[&str]) -> Result<Vec<String>, StoreError>;
}

/// Returns `true` if `id` is a syntactically acceptable corpus name:
/// nonempty ASCII lowercase alphanumerics and underscores only.
pub fn is_valid_corpus_token(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

struct Snapshot {
    corpora: Vec<String>,
    refreshed_at: Option<Instant>,
}

impl Snapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.refreshed_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// TTL-cached registry of valid corpus identifiers.
pub struct CorpusRegistry {
    source: Arc<dyn CorpusSource>,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh: tokio::sync::Mutex<()>,
    ttl: Duration,
}

impl CorpusRegistry {
    /// Creates a registry with the default TTL.
    pub fn new(source: Arc<dyn CorpusSource>) -> Self {
        Self::with_ttl(source, CORPUS_CACHE_TTL)
    }

    /// Creates a registry with a custom TTL (tests use short values).
    pub fn with_ttl(source: Arc<dyn CorpusSource>, ttl: Duration) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(Snapshot {
                corpora: Vec::new(),
                refreshed_at: None,
            })),
            refresh: tokio::sync::Mutex::new(()),
            ttl,
        }
    }

    /// Returns the current list of supported corpus identifiers.
    pub async fn supported(&self) -> Vec<String> {
        self.ensure_fresh().await;
        self.snapshot.read().corpora.clone()
    }

    /// Validates `id` and returns a [`CorpusId`] if it names a supported
    /// corpus. Charset validation happens before the snapshot lookup, so a
    /// hostile identifier never influences a refresh or reaches the store.
    pub async fn resolve(&self, id: &str) -> Option<CorpusId> {
        if !is_valid_corpus_token(id) {
            return None;
        }

        self.ensure_fresh().await;

        let snapshot = self.snapshot.read().clone();
        snapshot
            .corpora
            .iter()
            .any(|c| c == id)
            .then(|| CorpusId(id.to_string()))
    }

    async fn ensure_fresh(&self) {
        if self.snapshot.read().is_fresh(self.ttl) {
            return;
        }

        let _guard = self.refresh.lock().await;

        // Another task may have completed the refresh while we waited.
        if self.snapshot.read().is_fresh(self.ttl) {
            return;
        }

        let cold = self.snapshot.read().refreshed_at.is_none();

        match self.source.list_corpora(KNOWN_CORPORA).await {
            Ok(mut corpora) => {
                corpora.retain(|c| is_valid_corpus_token(c));
                corpora.sort();
                corpora.dedup();
                debug!(count = corpora.len(), "Corpus registry refreshed");
                self.install(corpora);
            }
            Err(e) if cold => {
                warn!(
                    error = %e,
                    "Corpus listing failed with no prior snapshot, using built-in defaults"
                );
                self.install(DEFAULT_CORPORA.iter().map(|s| s.to_string()).collect());
            }
            Err(e) => {
                // Stale-but-valid: keep serving the last good list and back
                // off for a full TTL before probing the store again.
                warn!(error = %e, "Corpus listing failed, keeping previous snapshot");
                let previous = self.snapshot.read().corpora.clone();
                self.install(previous);
            }
        }
    }

    fn install(&self, corpora: Vec<String>) {
        *self.snapshot.write() = Arc::new(Snapshot {
            corpora,
            refreshed_at: Some(Instant::now()),
        });
    }
}

impl std::fmt::Debug for CorpusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.read();
        f.debug_struct("CorpusRegistry")
            .field("corpora", &snapshot.corpora)
            .field("ttl", &self.ttl)
            .finish()
    }
}
