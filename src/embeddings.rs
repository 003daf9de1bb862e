//! Embedding provider abstraction used by the preprocessing pipeline.
//!
//! Model access is always an injected value; the crate holds no implicit
//! global model state.  Lifecycle of the underlying model is owned by the
//! caller.

use async_trait::async_trait;
use rig::embeddings::embedding::{EmbeddingModel, EmbeddingModelDyn};
use std::any::type_name;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::types::ChunkingError;

/// Abstract embedding provider used by the chunking pipeline.
///
/// Implementations must return one vector per input, in input order,
/// deterministically for a fixed model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError>;

    fn identify(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Shared reference type alias for embedding providers.
pub type SharedEmbeddingProvider = Arc<dyn EmbeddingProvider>;

/// Deterministic embeddings used for tests and offline runs.
#[derive(Clone, Default)]
pub struct MockEmbeddingProvider;

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(input: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        input.hash(&mut hasher);
        let seed = hasher.finish();
        // Small deterministic vector mixed out of the hash.
        (0..8)
            .map(|i| {
                let bits = seed.rotate_left(i * 8) ^ (u64::from(i) << 32);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Ok(inputs
            .iter()
            .map(|text| Self::hash_to_vector(text))
            .collect())
    }

    fn identify(&self) -> &'static str {
        "mock"
    }
}

/// Adapter that bridges a RIG [`EmbeddingModel`] into the local
/// [`EmbeddingProvider`] trait.
pub struct RigEmbeddingProvider {
    model: Arc<dyn EmbeddingModelDyn>,
    label: String,
}

impl RigEmbeddingProvider {
    /// Construct from a concrete RIG embedding model instance.
    pub fn from_model<M>(model: M) -> Self
    where
        M: EmbeddingModel + 'static,
    {
        let label = type_name::<M>().to_string();
        let arc = Arc::new(model);
        let dyn_arc: Arc<dyn EmbeddingModelDyn> = arc;
        Self::from_dyn(dyn_arc, Some(label))
    }

    /// Construct from a trait object handle.  The optional label defaults to
    /// a generic name and shows up in telemetry.
    pub fn from_dyn(model: Arc<dyn EmbeddingModelDyn>, label: Option<String>) -> Self {
        let label = label.unwrap_or_else(|| "rig-embedding".to_string());
        Self { model, label }
    }

    /// The model label used for telemetry.
    pub fn model_label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl EmbeddingProvider for RigEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed_texts(inputs.to_vec())
            .await
            .map_err(|err| ChunkingError::EmbeddingFailed {
                reason: err.to_string(),
            })?;

        Ok(embeddings
            .into_iter()
            .map(|embedding| {
                embedding
                    .vec
                    .into_iter()
                    .map(|value| value as f32)
                    .collect()
            })
            .collect())
    }

    fn identify(&self) -> &'static str {
        "rig"
    }
}

/// Provider that always fails; the service default when no embedder has been
/// configured, so misconfiguration surfaces as a clean error instead of a
/// panic.
#[derive(Default)]
pub struct NullEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Err(ChunkingError::EmbeddingFailed {
            reason: "embedding provider not configured".to_string(),
        })
    }

    fn identify(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_is_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];
        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
    }

    #[tokio::test]
    async fn mock_provider_preserves_length_and_order() {
        let provider = MockEmbeddingProvider::new();
        let inputs: Vec<String> = (0..5).map(|i| format!("sentence {i}")).collect();
        let embeddings = provider.embed_batch(&inputs).await.unwrap();
        assert_eq!(embeddings.len(), inputs.len());
        assert!(embeddings.iter().all(|e| e.len() == 8));
    }

    #[tokio::test]
    async fn null_provider_fails_cleanly() {
        let provider = NullEmbeddingProvider;
        let result = provider.embed_batch(&["text".to_string()]).await;
        assert!(matches!(
            result,
            Err(ChunkingError::EmbeddingFailed { .. })
        ));
    }
}
