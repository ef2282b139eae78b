use super::*;

use std::sync::Arc;

use crate::embedding::EmbedderConfig;
use crate::store::mock::MockSearchBackend;
use crate::store::{SearchBackend, Verse};

fn stub_embedder() -> MpnetEmbedder {
    MpnetEmbedder::load(EmbedderConfig::stub()).unwrap()
}

fn registry_for(backend: &MockSearchBackend) -> CorpusRegistry {
    CorpusRegistry::new(Arc::new(backend.clone()))
}

fn verse(id: i32, text: &str) -> Verse {
    Verse {
        id,
        book: "John".to_string(),
        chapter: 3,
        verse: id,
        text: text.to_string(),
    }
}

fn params(query: &str) -> SearchParams {
    SearchParams {
        query: query.to_string(),
        threshold: 0.6,
        corpus: "kjv".to_string(),
        max_results: 10,
    }
}

/// Blends `target` toward `other`; higher `weight` means higher cosine
/// similarity with `target`.
fn blend(target: &[f32], other: &[f32], weight: f32) -> Vec<f32> {
    target
        .iter()
        .zip(other.iter())
        .map(|(t, o)| t * weight + o * (1.0 - weight))
        .collect()
}

/// Seeds `kjv` with one exact match and two progressively weaker neighbors
/// of `query`, plus one unrelated verse. Returns the backend.
fn seeded_backend(embedder: &MpnetEmbedder, query: &str) -> MockSearchBackend {
    let backend = MockSearchBackend::new();
    let q = embedder.embed(query).unwrap();
    let far = embedder.embed("an entirely unrelated passage").unwrap();

    backend.insert_verse("kjv", verse(1, "exact match"), q.clone());
    backend.insert_verse("kjv", verse(2, "close match"), blend(&q, &far, 0.9));
    backend.insert_verse("kjv", verse(3, "weaker match"), blend(&q, &far, 0.8));
    backend.insert_verse("kjv", verse(4, "unrelated"), far);

    backend
}

#[tokio::test]
async fn test_threshold_out_of_range_is_rejected() {
    let embedder = stub_embedder();
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    for threshold in [-0.1, 1.5, f64::NAN] {
        let mut request = params("love your neighbour");
        request.threshold = threshold;

        let result = run_search(&embedder, &registry, &mut session, &request).await;
        assert!(matches!(result, Err(SearchError::InvalidThreshold(_))));
    }

    assert_eq!(backend.search_calls(), 0);
}

#[tokio::test]
async fn test_limit_out_of_range_is_rejected() {
    let embedder = stub_embedder();
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    for max_results in [0u16, 101, 150] {
        let mut request = params("love your neighbour");
        request.max_results = max_results;

        let result = run_search(&embedder, &registry, &mut session, &request).await;
        assert!(matches!(result, Err(SearchError::InvalidLimit(_))));
    }

    assert_eq!(backend.search_calls(), 0);
}

#[tokio::test]
async fn test_unknown_corpus_is_rejected_before_store_access() {
    let embedder = stub_embedder();
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let mut request = params("love your neighbour");
    request.corpus = "xyz".to_string();

    let result = run_search(&embedder, &registry, &mut session, &request).await;
    assert!(matches!(result, Err(SearchError::UnknownCorpus(_))));
    assert!(result.unwrap_err().is_validation());

    assert_eq!(backend.search_calls(), 0);
    assert_eq!(backend.fetch_calls(), 0);
}

#[tokio::test]
async fn test_empty_query_short_circuits() {
    let embedder = stub_embedder();
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    for query in ["", "   ", "\t\n"] {
        let results = run_search(&embedder, &registry, &mut session, &params(query))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    assert_eq!(backend.search_calls(), 0);
    assert_eq!(backend.fetch_calls(), 0);
}

#[tokio::test]
async fn test_results_ranked_and_thresholded() {
    let embedder = stub_embedder();
    let query = "love your neighbour";
    let backend = seeded_backend(&embedder, query);
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let results = run_search(&embedder, &registry, &mut session, &params(query))
        .await
        .unwrap();

    // The unrelated verse falls below threshold; the rest come back in
    // descending similarity order.
    let ids: Vec<i32> = results.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_result_cap_applies_after_ranking() {
    let embedder = stub_embedder();
    let query = "love your neighbour";
    let backend = seeded_backend(&embedder, query);
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let mut request = params(query);
    request.max_results = 2;

    let results = run_search(&embedder, &registry, &mut session, &request)
        .await
        .unwrap();

    let ids: Vec<i32> = results.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_no_hits_skips_hydration() {
    let embedder = stub_embedder();
    let query = "love your neighbour";
    let backend = MockSearchBackend::new();
    let far = embedder.embed("an entirely unrelated passage").unwrap();
    backend.insert_verse("kjv", verse(1, "unrelated"), far);
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let mut request = params(query);
    request.threshold = 0.99;

    let results = run_search(&embedder, &registry, &mut session, &request)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(backend.search_calls(), 1);
    assert_eq!(backend.fetch_calls(), 0);
}

#[tokio::test]
async fn test_hydration_restores_rank_order() {
    // The mock fetch deliberately returns rows id-descending; the pipeline
    // must put them back into rank order.
    let embedder = stub_embedder();
    let query = "love your neighbour";
    let backend = seeded_backend(&embedder, query);
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let results = run_search(&embedder, &registry, &mut session, &params(query))
        .await
        .unwrap();

    assert_eq!(
        results.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_missing_verse_rows_are_omitted() {
    let embedder = stub_embedder();
    let query = "love your neighbour";
    let backend = seeded_backend(&embedder, query);
    let q = embedder.embed(query).unwrap();
    backend.insert_orphan_embedding("kjv", 99, q);
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    let results = run_search(&embedder, &registry, &mut session, &params(query))
        .await
        .unwrap();

    // Verse 99 ranks but has no row; it vanishes without disturbing order.
    assert_eq!(
        results.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let embedder = stub_embedder();
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    let registry = registry_for(&backend);
    let mut session = backend.session().await.unwrap();

    backend.set_fail_search(true);

    let result = run_search(&embedder, &registry, &mut session, &params("anything")).await;
    match result {
        Err(SearchError::Store(err)) => assert!(!err.is_connection()),
        other => panic!("expected store error, got {:?}", other),
    }
}

#[test]
fn test_order_by_rank_reorders_and_drops() {
    let rows = vec![verse(3, "c"), verse(1, "a"), verse(5, "e")];
    let ordered = order_by_rank(&[1, 2, 3], rows);

    assert_eq!(ordered.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 3]);
}
