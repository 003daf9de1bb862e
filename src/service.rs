//! Per-document orchestration: normalize → segment → embed → detect → assemble.
//!
//! The service owns defaults and the embedding cache; each
//! [`process_document`](PreprocessingService::process_document) invocation
//! exclusively owns its text, sentences, and embeddings, so concurrent
//! invocations need no coordination beyond the cache's own lock.

use std::sync::Arc;
use std::time::Instant;

use rig::embeddings::{EmbeddingModel, embedding::EmbeddingModelDyn};
use serde::Serialize;
use tracing::{Instrument, field, info_span};
use uuid::Uuid;

use crate::assembly::assemble;
use crate::breakpoints::{cosine_distances, detect_breakpoints};
use crate::cache::{CacheHandle, CacheMetrics};
use crate::config::{ChunkingConfig, NormalizerConfig, PreprocessingModuleConfig};
use crate::embeddings::{NullEmbeddingProvider, RigEmbeddingProvider, SharedEmbeddingProvider};
use crate::normalize::{normalize, normalize_pages};
use crate::segmenter::segment;
use crate::types::{ChunkingError, ChunkingOutcome};

/// Façade over the whole preprocessing pipeline.
///
/// Build one with [`PreprocessingService::builder`], inject an embedding
/// provider, and call [`process_document`](Self::process_document) per
/// document.
pub struct PreprocessingService {
    defaults: PreprocessingModuleConfig,
    base_embedder: Option<EmbedderKind>,
    null_provider: SharedEmbeddingProvider,
    cache: CacheHandle,
}

impl PreprocessingService {
    pub fn builder() -> PreprocessingServiceBuilder {
        PreprocessingServiceBuilder::new()
    }

    pub fn default_config(&self) -> &PreprocessingModuleConfig {
        &self.defaults
    }

    /// Run the full pipeline over one document.
    ///
    /// Empty input is not an error and yields an empty chunk list.  Documents
    /// with fewer than two sentences never touch the embedding provider.
    pub async fn process_document(
        &self,
        request: ProcessDocumentRequest,
    ) -> Result<ProcessDocumentResponse, ChunkingError> {
        let chunking_cfg = request
            .chunking_config
            .clone()
            .unwrap_or_else(|| self.defaults.chunking.clone());
        chunking_cfg.validate()?;
        let normalizer_cfg = request
            .normalizer_config
            .clone()
            .unwrap_or_else(|| self.defaults.normalizer.clone());

        let provider = self.resolve_provider(request.embedder.clone());
        let document_id = Uuid::new_v4();

        let span = info_span!(
            "process_document",
            document = %document_id,
            embedder = %provider.label,
            sentences = field::Empty,
            chunks = field::Empty,
            cache_hits = field::Empty,
            cache_misses = field::Empty,
            duration_ms = field::Empty,
        );
        let inner = span.clone();

        async move {
            let start = Instant::now();
            self.cache.apply_capacity(chunking_cfg.cache_capacity);

            let normalized = match &request.page_offsets {
                Some(offsets) => normalize_pages(&request.raw_text, offsets, &normalizer_cfg),
                None => normalize(&request.raw_text, &normalizer_cfg),
            };
            let sentences = segment(&normalized, &chunking_cfg.abbreviation_exceptions);

            let (distances, cache_hits, cache_misses) = if sentences.len() < 2 {
                (Vec::new(), 0, 0)
            } else {
                let texts: Vec<String> =
                    sentences.iter().map(|sentence| sentence.text.clone()).collect();
                let before = self.cache.metrics();
                let embeddings = self.embed_sentences(&provider.shared, &texts).await?;
                let after = self.cache.metrics();
                let (hits, misses) = metrics_diff(before, after);
                (cosine_distances(&embeddings), hits, misses)
            };

            let breakpoints = detect_breakpoints(&distances, chunking_cfg.breakpoint_percentile);
            let (chunks, trace, stats) =
                assemble(&normalized, &sentences, &distances, &breakpoints, &chunking_cfg);

            let duration_ms = start.elapsed().as_millis();
            inner.record("sentences", field::display(sentences.len()));
            inner.record("chunks", field::display(chunks.len()));
            inner.record("cache_hits", field::display(cache_hits));
            inner.record("cache_misses", field::display(cache_misses));
            inner.record("duration_ms", field::display(duration_ms));

            let telemetry = ProcessTelemetry {
                document_id,
                embedder: provider.label,
                raw_chars: request.raw_text.chars().count(),
                sentence_count: sentences.len(),
                chunk_count: chunks.len(),
                average_size: stats.average_size,
                cache_hits,
                cache_misses,
                duration_ms,
                breakpoint_percentile: chunking_cfg.breakpoint_percentile,
            };

            Ok(ProcessDocumentResponse {
                outcome: ChunkingOutcome {
                    chunks,
                    trace: Some(trace),
                    stats,
                },
                telemetry,
            })
        }
        .instrument(span)
        .await
    }

    /// Embed all sentence texts through one provider call, short-circuiting
    /// through the cache for texts seen before.
    async fn embed_sentences(
        &self,
        provider: &SharedEmbeddingProvider,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, ChunkingError> {
        if self.cache.capacity().is_none() {
            let embeddings = provider.embed_batch(texts).await?;
            ensure_count(embeddings.len(), texts.len())?;
            return Ok(embeddings);
        }

        let mut resolved: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut missing: Vec<usize> = Vec::new();
        {
            let mut guard = self.cache.lock();
            match guard.as_mut() {
                Some(cache) => {
                    for (idx, text) in texts.iter().enumerate() {
                        match cache.get(text) {
                            Some(vector) => resolved[idx] = Some(vector),
                            None => missing.push(idx),
                        }
                    }
                }
                None => missing.extend(0..texts.len()),
            }
        }

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&idx| texts[idx].clone()).collect();
            let embeddings = provider.embed_batch(&batch).await?;
            ensure_count(embeddings.len(), batch.len())?;

            let mut guard = self.cache.lock();
            for (&idx, embedding) in missing.iter().zip(embeddings.into_iter()) {
                if let Some(cache) = guard.as_mut() {
                    cache.insert(&texts[idx], embedding.clone());
                }
                resolved[idx] = Some(embedding);
            }
        }

        Ok(resolved
            .into_iter()
            .map(|entry| entry.expect("resolved embedding"))
            .collect())
    }

    fn resolve_provider(&self, override_embedder: Option<EmbedderKind>) -> ProviderContext {
        match override_embedder.or_else(|| self.base_embedder.clone()) {
            Some(EmbedderKind::Rig(handle)) => {
                let label = handle.model_label().to_string();
                let shared: SharedEmbeddingProvider = handle;
                ProviderContext { shared, label }
            }
            Some(EmbedderKind::Provider(provider)) => ProviderContext {
                label: provider.identify().to_string(),
                shared: provider,
            },
            None => ProviderContext {
                shared: self.null_provider.clone(),
                label: "unconfigured".to_string(),
            },
        }
    }
}

fn ensure_count(returned: usize, expected: usize) -> Result<(), ChunkingError> {
    if returned == expected {
        Ok(())
    } else {
        Err(ChunkingError::EmbeddingFailed {
            reason: format!("provider returned {returned} vectors for {expected} sentences"),
        })
    }
}

fn metrics_diff(before: Option<CacheMetrics>, after: Option<CacheMetrics>) -> (usize, usize) {
    match (before, after) {
        (Some(prev), Some(next)) => (
            next.hits.saturating_sub(prev.hits),
            next.misses.saturating_sub(prev.misses),
        ),
        _ => (0, 0),
    }
}

/// Embedding backends a request or service can carry.
#[derive(Clone)]
pub enum EmbedderKind {
    Rig(Arc<RigEmbeddingProvider>),
    Provider(SharedEmbeddingProvider),
}

pub struct PreprocessingServiceBuilder {
    defaults: PreprocessingModuleConfig,
    embedder: Option<EmbedderKind>,
}

impl PreprocessingServiceBuilder {
    fn new() -> Self {
        Self {
            defaults: PreprocessingModuleConfig::default(),
            embedder: None,
        }
    }

    pub fn with_module_config(mut self, config: PreprocessingModuleConfig) -> Self {
        self.defaults = config;
        self
    }

    pub fn with_rig_model<M>(mut self, model: M) -> Self
    where
        M: EmbeddingModel + 'static,
    {
        let provider = Arc::new(RigEmbeddingProvider::from_model(model));
        self.embedder = Some(EmbedderKind::Rig(provider));
        self
    }

    pub fn with_rig_model_dyn(
        mut self,
        model: Arc<dyn EmbeddingModelDyn>,
        label: Option<String>,
    ) -> Self {
        let provider = Arc::new(RigEmbeddingProvider::from_dyn(model, label));
        self.embedder = Some(EmbedderKind::Rig(provider));
        self
    }

    pub fn with_embedding_provider(mut self, provider: SharedEmbeddingProvider) -> Self {
        self.embedder = Some(EmbedderKind::Provider(provider));
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.defaults.chunking.cache_capacity = Some(capacity);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.defaults.chunking.cache_capacity = Some(0);
        self
    }

    pub fn build(self) -> PreprocessingService {
        let null_provider: SharedEmbeddingProvider = Arc::new(NullEmbeddingProvider);
        let cache = CacheHandle::from_capacity(self.defaults.chunking.cache_capacity);
        PreprocessingService {
            defaults: self.defaults,
            base_embedder: self.embedder,
            null_provider,
            cache,
        }
    }
}

/// One document's worth of input to the pipeline.
#[derive(Clone)]
pub struct ProcessDocumentRequest {
    /// Post-extraction, pre-normalization text.
    pub raw_text: String,
    /// Byte offsets into `raw_text` where pages begin.
    pub page_offsets: Option<Vec<usize>>,
    pub chunking_config: Option<ChunkingConfig>,
    pub normalizer_config: Option<NormalizerConfig>,
    pub embedder: Option<EmbedderKind>,
}

impl ProcessDocumentRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            page_offsets: None,
            chunking_config: None,
            normalizer_config: None,
            embedder: None,
        }
    }

    pub fn with_page_offsets(mut self, offsets: Vec<usize>) -> Self {
        self.page_offsets = Some(offsets);
        self
    }

    pub fn with_chunking_config(mut self, config: ChunkingConfig) -> Self {
        self.chunking_config = Some(config);
        self
    }

    pub fn update_chunking_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ChunkingConfig),
    {
        let mut cfg = self.chunking_config.take().unwrap_or_default();
        f(&mut cfg);
        self.chunking_config = Some(cfg);
        self
    }

    pub fn with_normalizer_config(mut self, config: NormalizerConfig) -> Self {
        self.normalizer_config = Some(config);
        self
    }

    pub fn with_embedder(mut self, embedder: EmbedderKind) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

pub struct ProcessDocumentResponse {
    pub outcome: ChunkingOutcome,
    pub telemetry: ProcessTelemetry,
}

/// Per-document processing summary, cheap to log or serialize.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessTelemetry {
    pub document_id: Uuid,
    pub embedder: String,
    pub raw_chars: usize,
    pub sentence_count: usize,
    pub chunk_count: usize,
    pub average_size: f32,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub duration_ms: u128,
    pub breakpoint_percentile: u8,
}

struct ProviderContext {
    shared: SharedEmbeddingProvider,
    label: String,
}
