use super::mock::{MockSearchBackend, cosine_similarity};
use super::*;

fn verse(id: i32, book: &str, chapter: i32, number: i32, text: &str) -> Verse {
    Verse {
        id,
        book: book.to_string(),
        chapter,
        verse: number,
        text: text.to_string(),
    }
}

#[test]
fn test_vector_to_pg_format() {
    assert_eq!(vector_to_pg(&[]), "[]");
    assert_eq!(vector_to_pg(&[1.0]), "[1]");
    assert_eq!(vector_to_pg(&[0.5, -0.25, 2.0]), "[0.5,-0.25,2]");
}

#[test]
fn test_store_error_classification() {
    let err = StoreError::from(sqlx::Error::PoolTimedOut);
    assert!(err.is_connection());

    let err = StoreError::from(sqlx::Error::RowNotFound);
    assert!(!err.is_connection());
}

#[test]
fn test_cosine_similarity_identical_vectors() {
    let v = [0.6, 0.8];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
}

#[test]
fn test_cosine_similarity_orthogonal_vectors() {
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
}

#[test]
fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[tokio::test]
async fn test_mock_nearest_filters_sorts_and_caps() {
    let backend = MockSearchBackend::new();
    backend.insert_verse("kjv", verse(1, "John", 3, 16, "a"), vec![1.0, 0.0]);
    backend.insert_verse("kjv", verse(2, "John", 3, 17, "b"), vec![0.9, 0.1]);
    backend.insert_verse("kjv", verse(3, "John", 3, 18, "c"), vec![0.0, 1.0]);

    let corpus = crate::registry::CorpusId::unchecked("kjv");
    let mut session = backend.session().await.unwrap();

    let hits = session
        .nearest(&corpus, &[1.0, 0.0], 0.5, 10)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].verse_id, 1);
    assert_eq!(hits[1].verse_id, 2);
    assert!(hits[0].score >= hits[1].score);

    let capped = session.nearest(&corpus, &[1.0, 0.0], 0.5, 1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].verse_id, 1);
}

#[tokio::test]
async fn test_mock_nearest_tie_breaks_by_id() {
    let backend = MockSearchBackend::new();
    backend.insert_verse("kjv", verse(7, "Luke", 1, 1, "a"), vec![1.0, 0.0]);
    backend.insert_verse("kjv", verse(2, "Luke", 1, 2, "b"), vec![1.0, 0.0]);

    let corpus = crate::registry::CorpusId::unchecked("kjv");
    let mut session = backend.session().await.unwrap();

    let hits = session.nearest(&corpus, &[1.0, 0.0], 0.0, 10).await.unwrap();
    assert_eq!(
        hits.iter().map(|h| h.verse_id).collect::<Vec<_>>(),
        vec![2, 7]
    );
}

#[tokio::test]
async fn test_mock_fetch_returns_rows_out_of_rank_order() {
    let backend = MockSearchBackend::new();
    backend.insert_verse("kjv", verse(1, "Mark", 1, 1, "a"), vec![1.0]);
    backend.insert_verse("kjv", verse(2, "Mark", 1, 2, "b"), vec![1.0]);
    backend.insert_verse("kjv", verse(3, "Mark", 1, 3, "c"), vec![1.0]);

    let corpus = crate::registry::CorpusId::unchecked("kjv");
    let mut session = backend.session().await.unwrap();

    let rows = session.fetch_verses(&corpus, &[1, 3, 2]).await.unwrap();
    assert_eq!(rows.iter().map(|v| v.id).collect::<Vec<_>>(), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_mock_session_counters() {
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");

    let corpus = crate::registry::CorpusId::unchecked("kjv");
    let mut session = backend.session().await.unwrap();
    session.nearest(&corpus, &[1.0], 0.0, 10).await.unwrap();
    session.fetch_verses(&corpus, &[1]).await.unwrap();
    drop(session);

    let _again = backend.session().await.unwrap();

    assert_eq!(backend.sessions_opened(), 2);
    assert_eq!(backend.search_calls(), 1);
    assert_eq!(backend.fetch_calls(), 1);
}

#[tokio::test]
async fn test_mock_connection_failure_modes() {
    let backend = MockSearchBackend::new();
    backend.add_corpus("kjv");
    backend.set_fail_connection(true);

    assert!(matches!(
        backend.session().await,
        Err(StoreError::Connection { .. })
    ));
}
