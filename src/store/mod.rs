//! Similarity-capable verse store.
//!
//! Each corpus lives in its own Postgres schema with a `verses` table and a
//! pgvector `embeddings` table. [`SearchBackend`] owns the bounded connection
//! pool; [`SearchSession`] is one checked-out connection. The stateless
//! endpoint opens a session per request, the WebSocket endpoint holds one for
//! the whole conversation — both over the same abstraction.
//!
//! Schema names are only ever interpolated from [`CorpusId`] values, which
//! the registry constructs after charset and membership validation.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;

#[cfg(test)]
mod tests;

pub use error::StoreError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockSearchBackend, MockSearchSession};
pub use model::{ScoredVerse, Verse, VerseRecord};

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::registry::{CorpusId, CorpusSource};

/// How long to wait for a pooled connection before giving up.
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Store handle shared by all request tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    type Session: SearchSession + 'static;

    /// Checks one connection out of the pool. Dropping the session returns
    /// it on every exit path.
    async fn session(&self) -> Result<Self::Session, StoreError>;
}

/// One checked-out store connection; all statements on a session run
/// sequentially.
#[async_trait]
pub trait SearchSession: Send {
    /// Ranked nearest-neighbor lookup scoped to `corpus`.
    ///
    /// Scores are `1 - cosine_distance`; only hits with
    /// `score >= threshold` are returned, ordered by score descending with
    /// verse id ascending as the tiebreak, at most `limit` of them.
    async fn nearest(
        &mut self,
        corpus: &CorpusId,
        query: &[f32],
        threshold: f64,
        limit: u16,
    ) -> Result<Vec<ScoredVerse>, StoreError>;

    /// Bulk-fetches full verses by id, scoped to `corpus`. Row order is
    /// whatever the store returns; callers re-order by rank.
    async fn fetch_verses(
        &mut self,
        corpus: &CorpusId,
        ids: &[i32],
    ) -> Result<Vec<Verse>, StoreError>;
}

/// Postgres + pgvector backend.
#[derive(Clone)]
pub struct PgSearchBackend {
    pool: PgPool,
}

impl PgSearchBackend {
    /// Connects a bounded pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool (used by tests and tooling).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SearchBackend for PgSearchBackend {
    type Session = PgSearchSession;

    async fn session(&self) -> Result<PgSearchSession, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(PgSearchSession { conn })
    }
}

#[async_trait]
impl CorpusSource for PgSearchBackend {
    async fn list_corpora(&self, allowed: &[&str]) -> Result<Vec<String>, StoreError> {
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();

        let rows = sqlx::query(
            "SELECT schema_name::text AS schema_name \
             FROM information_schema.schemata \
             WHERE schema_name::text = ANY($1) \
             ORDER BY schema_name",
        )
        .bind(&allowed)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.try_get("schema_name").map_err(StoreError::from))
            .collect()
    }
}

/// One checked-out Postgres connection.
pub struct PgSearchSession {
    conn: sqlx::pool::PoolConnection<sqlx::Postgres>,
}

#[async_trait]
impl SearchSession for PgSearchSession {
    async fn nearest(
        &mut self,
        corpus: &CorpusId,
        query: &[f32],
        threshold: f64,
        limit: u16,
    ) -> Result<Vec<ScoredVerse>, StoreError> {
        // `corpus` is a validated CorpusId, the only value ever interpolated
        // into a schema-qualified statement.
        let sql = format!(
            "WITH distances AS ( \
                 SELECT verse_id, encoding <=> $1::text::vector AS distance \
                 FROM {schema}.embeddings \
             ) \
             SELECT verse_id, 1 - distance AS score \
             FROM distances \
             WHERE 1 - distance >= $2 \
             ORDER BY distance ASC, verse_id ASC \
             LIMIT $3",
            schema = corpus.as_str()
        );

        let rows = sqlx::query(&sql)
            .bind(vector_to_pg(query))
            .bind(threshold)
            .bind(i64::from(limit))
            .fetch_all(self.conn.as_mut())
            .await?;

        debug!(corpus = %corpus, hits = rows.len(), "Similarity search complete");

        rows.into_iter()
            .map(|row| {
                Ok(ScoredVerse {
                    verse_id: row.try_get("verse_id")?,
                    score: row.try_get("score")?,
                })
            })
            .collect()
    }

    async fn fetch_verses(
        &mut self,
        corpus: &CorpusId,
        ids: &[i32],
    ) -> Result<Vec<Verse>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, book, chapter, verse, text \
             FROM {schema}.verses \
             WHERE id = ANY($1)",
            schema = corpus.as_str()
        );

        let rows = sqlx::query(&sql)
            .bind(ids.to_vec())
            .fetch_all(self.conn.as_mut())
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Verse {
                    id: row.try_get("id")?,
                    book: row.try_get("book")?,
                    chapter: row.try_get("chapter")?,
                    verse: row.try_get("verse")?,
                    text: row.try_get("text")?,
                })
            })
            .collect()
    }
}

/// Renders a vector as a pgvector text literal (`[v1,v2,...]`).
pub fn vector_to_pg(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 12 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}
