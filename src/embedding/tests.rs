use super::*;
use crate::constants::EMBEDDING_DIM;

fn stub_embedder() -> MpnetEmbedder {
    MpnetEmbedder::load(EmbedderConfig::stub()).expect("stub embedder should load")
}

#[test]
fn test_stub_embedder_loads() {
    let embedder = stub_embedder();
    assert!(embedder.is_stub());
    assert_eq!(embedder.embedding_dim(), EMBEDDING_DIM);
}

#[test]
fn test_stub_embedding_has_configured_dim() {
    let embedder = stub_embedder();
    let vector = embedder.embed("love your neighbour").unwrap();
    assert_eq!(vector.len(), EMBEDDING_DIM);
}

#[test]
fn test_stub_embedding_is_deterministic() {
    let embedder = stub_embedder();
    let a = embedder.embed("in the beginning").unwrap();
    let b = embedder.embed("in the beginning").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_stub_embedding_differs_per_input() {
    let embedder = stub_embedder();
    let a = embedder.embed("faith hope and charity").unwrap();
    let b = embedder.embed("render unto caesar").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_stub_embedding_is_normalized() {
    let embedder = stub_embedder();
    let vector = embedder.embed("a light unto my path").unwrap();
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {}", norm);
}

#[test]
fn test_non_stub_requires_model_dir() {
    let result = MpnetEmbedder::load(EmbedderConfig::default());
    assert!(matches!(
        result,
        Err(EmbeddingError::InvalidConfig { .. })
    ));
}

#[test]
fn test_non_stub_missing_dir_is_model_not_found() {
    let result = MpnetEmbedder::load(EmbedderConfig::new("/nonexistent/model/dir"));
    assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));
}

#[test]
fn test_normalize_zero_vector_is_identity() {
    let zeros = super::normalize(vec![0.0; 4]);
    assert_eq!(zeros, vec![0.0; 4]);
}
